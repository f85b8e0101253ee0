#![no_main]

use {
    libfuzzer_sys::fuzz_target,
    stackheap::Message,
    std::borrow::Cow,
};

stackheap::enumeration! {
    enum Language: u32 {
        English = 0,
        Persian = 1,
        German = 4,
    }
}

#[derive(Message, Debug, PartialEq)]
struct Paging {
    offset: u64,
    limit: u64,
}

#[derive(Message, Debug, PartialEq)]
struct GetPosts<'a> {
    #[stackheap(key = "ID")]
    id: [u8; 32],
    #[stackheap(key = "IDs")]
    ids: Cow<'a, [[u8; 32]]>,
    offset: i64,
}

#[derive(Message, Debug, PartialEq)]
struct Article<'a> {
    #[stackheap(key = "ID")]
    id: [u8; 16],
    language: Language,
    languages: Vec<Language>,
    title: Cow<'a, str>,
    text: Cow<'a, str>,
    image: Cow<'a, [u8]>,
    tags: Vec<u16>,
}

macro_rules! fuzz_roundtrip {
    ($data:expr, $ty:ident) => {
        if let Ok(value) = $ty::decode_binary($data) {
            let encoded = value.to_binary();
            assert_eq!(encoded.len(), value.binary_len());
            let roundtrip = $ty::decode_binary(&encoded).expect("binary roundtrip should decode");
            assert_eq!(value, roundtrip, "binary roundtrip failed for {}", stringify!($ty));
        }
        if let Ok(value) = $ty::decode_json($data) {
            let encoded = value.encode_json();
            assert_eq!(encoded.len(), value.json_len());
            let roundtrip = $ty::decode_json(&encoded).expect("json roundtrip should decode");
            assert_eq!(value, roundtrip, "json roundtrip failed for {}", stringify!($ty));
        }
    };
}

fuzz_target!(|data: &[u8]| {
    fuzz_roundtrip!(data, Paging);
    fuzz_roundtrip!(data, GetPosts);
    fuzz_roundtrip!(data, Article);
});
