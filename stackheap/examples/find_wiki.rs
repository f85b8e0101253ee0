//! A request/response pair served over both wire forms.
//!
//! Binary payloads travel behind a 4 byte transport header the dispatch layer
//! owns; the codec writes into the slice after it. JSON payloads are the bare
//! minified object.
use {stackheap::Message, std::borrow::Cow};

const HEADER_LEN: usize = 4;

stackheap::enumeration! {
    pub enum Language: u32 {
        English = 0,
        Persian = 1,
    }
}

#[derive(Message, Debug, PartialEq)]
struct FindWikiByUriReq<'a> {
    #[stackheap(key = "URI")]
    uri: Cow<'a, str>,
    offset: u64,
    limit: u64,
}

#[derive(Message, Debug, PartialEq)]
struct FindWikiByUriRes<'a> {
    #[stackheap(key = "IDs")]
    ids: Cow<'a, [[u8; 32]]>,
    languages: Vec<Language>,
}

fn find(req: &FindWikiByUriReq<'_>) -> FindWikiByUriRes<'static> {
    let count = req.limit.min(3) as u8;
    FindWikiByUriRes {
        ids: Cow::Owned((0..count).map(|i| [i; 32]).collect()),
        languages: (0..count)
            .map(|i| match i % 2 {
                0 => Language::English,
                _ => Language::Persian,
            })
            .collect(),
    }
}

/// Serve a binary request: decode after the header, answer behind a header.
fn serve_binary(frame: &[u8]) -> stackheap::Result<Vec<u8>> {
    let body = frame
        .get(HEADER_LEN..)
        .ok_or_else(|| stackheap::error::truncated_input(HEADER_LEN as u32, frame.len()))?;
    let req = FindWikiByUriReq::decode_binary(body)?;
    let res = find(&req);
    let mut out = vec![0u8; HEADER_LEN + res.binary_len()];
    res.encode_binary(&mut out[HEADER_LEN..]);
    Ok(out)
}

fn serve_json(body: &[u8]) -> stackheap::Result<Vec<u8>> {
    let req = FindWikiByUriReq::decode_json(body)?;
    Ok(find(&req).encode_json())
}

fn main() -> stackheap::Result<()> {
    let req = FindWikiByUriReq {
        uri: Cow::Borrowed("/wiki/rust"),
        offset: 0,
        limit: 2,
    };

    let mut frame = vec![0u8; HEADER_LEN + req.binary_len()];
    req.encode_binary(&mut frame[HEADER_LEN..]);
    let out = serve_binary(&frame)?;
    let res = FindWikiByUriRes::decode_binary(&out[HEADER_LEN..])?;
    println!("binary: {} bytes, {} ids", out.len(), res.ids.len());

    let out = serve_json(br#"{"URI":"/wiki/rust","Offset":0,"Limit":2}"#)?;
    println!("json: {}", String::from_utf8_lossy(&out));
    assert_eq!(FindWikiByUriRes::decode_json(&out)?, res);

    if let Err(err) = serve_json(br#"{"URI":"/wiki/rust"}"#) {
        println!("rejected: {err}");
    }
    assert_eq!(
        serve_binary(&[0; 2]),
        Err(stackheap::Error::TruncatedInput { needed: 4, len: 2 })
    );
    Ok(())
}
