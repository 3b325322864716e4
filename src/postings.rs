use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One occurrence record: the term appears `term_freq` times in `doc_id`.
/// Within a postings list, `doc_id` is strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: u32,
    pub term_freq: u32,
}

/// One element of the dictionary stream. `Entry::len` is the byte length of
/// the term's serialized postings list; replaying the stream and summing the
/// lengths of all preceding entries reconstructs each term's absolute offset
/// into the postings file. `Boundary` terminates each n-gram model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DictRecord {
    Entry { term: String, len: u64 },
    Boundary,
}

/// Serializes a postings list and returns its framed bytes. The frame is
/// self-describing (element count up front), so the searcher can read one
/// list from a seek position without any out-of-band length.
pub fn serialize_postings(postings: &[Posting]) -> Result<Vec<u8>, Error> {
    Ok(bincode::serialize(postings)?)
}

pub fn write_record<W: Write>(writer: &mut W, record: &DictRecord) -> Result<(), Error> {
    Ok(bincode::serialize_into(writer, record)?)
}

/// Reads the next value from a stream of bincode records; `None` at clean EOF.
pub fn read_stream_value<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>, Error> {
    match bincode::deserialize_from(reader) {
        Ok(value) => Ok(Some(value)),
        Err(e) => match *e {
            bincode::ErrorKind::Io(ref io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            _ => Err(Error::Codec(e)),
        },
    }
}

pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<DictRecord>, Error> {
    read_stream_value(reader)
}

/// Seeks to a dictionary offset and reads back exactly one postings list.
/// An offset at or past EOF means the dictionary and postings files do not
/// belong together; the caller decides whether to skip the term or abort.
pub fn read_postings_at(file: &mut File, offset: u64) -> Result<Vec<Posting>, Error> {
    let len = file.metadata()?.len();
    if offset >= len {
        return Err(Error::SeekRange { offset, len });
    }
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(&mut *file);
    Ok(bincode::deserialize_from(&mut reader)?)
}
