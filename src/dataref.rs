//! Polymorphic byte-range handles used throughout the demuxers.
//!
//! Grounded on `mcio_base.py`'s `DataRefFile`/`DataRefBytes`: a demuxed sample
//! is described by where its bytes live rather than by copying them up front.
//! `Borrowed` is the one addition beyond the original — Python's reference
//! counted `bytes` already gives zero-copy sub-slices for free, so this crate
//! needs an explicit variant to get the same effect over a shared buffer.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::{Arc, Mutex};

/// A reference to a contiguous run of bytes, without committing to where
/// those bytes are actually stored.
#[derive(Clone)]
pub enum DataRef {
    /// Bytes living at `offset..offset+size` in a (possibly shared) file.
    File {
        /// The backing file, shared so multiple `DataRef`s can read from it.
        file: Arc<Mutex<File>>,
        /// Byte offset of the run's start.
        offset: u64,
        /// Length of the run in bytes.
        size: u64,
    },
    /// Bytes owned outright by this `DataRef`.
    Owned(Arc<[u8]>),
    /// A zero-copy view into a shared buffer owned elsewhere.
    Borrowed(Arc<[u8]>, Range<usize>),
}

impl DataRef {
    /// Build a `DataRef` over a region of a file.
    pub fn from_file(file: Arc<Mutex<File>>, offset: u64, size: u64) -> Self {
        DataRef::File { file, offset, size }
    }

    /// Build a `DataRef` that owns its bytes.
    pub fn from_owned(data: impl Into<Arc<[u8]>>) -> Self {
        DataRef::Owned(data.into())
    }

    /// Build a zero-copy `DataRef` viewing a sub-range of a shared buffer.
    pub fn from_borrowed(data: Arc<[u8]>, range: Range<usize>) -> crate::Result<Self> {
        if range.end > data.len() {
            return Err(crate::Error::OutOfBounds);
        }
        Ok(DataRef::Borrowed(data, range))
    }

    /// The number of bytes this reference spans.
    pub fn size(&self) -> u64 {
        match self {
            DataRef::File { size, .. } => *size,
            DataRef::Owned(data) => data.len() as u64,
            DataRef::Borrowed(_, range) => (range.end - range.start) as u64,
        }
    }

    /// Materialise the referenced bytes, reading from the file if necessary.
    pub fn get_data(&self) -> std::io::Result<Vec<u8>> {
        match self {
            DataRef::File { file, offset, size } => {
                let mut file = file.lock().expect("DataRef file lock poisoned");
                file.seek(SeekFrom::Start(*offset))?;
                let mut buf = vec![0u8; *size as usize];
                file.read_exact(&mut buf)?;
                Ok(buf)
            }
            DataRef::Owned(data) => Ok(data.to_vec()),
            DataRef::Borrowed(data, range) => Ok(data[range.clone()].to_vec()),
        }
    }
}

impl fmt::Debug for DataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataRef::File { offset, size, .. } => {
                f.debug_struct("DataRef::File").field("offset", offset).field("size", size).finish()
            }
            DataRef::Owned(data) => f.debug_tuple("DataRef::Owned").field(&data.len()).finish(),
            DataRef::Borrowed(_, range) => f.debug_tuple("DataRef::Borrowed").field(range).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_roundtrip() {
        let dref = DataRef::from_owned(vec![1u8, 2, 3]);
        assert_eq!(dref.size(), 3);
        assert_eq!(dref.get_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn borrowed_is_a_view_not_a_copy() {
        let backing: Arc<[u8]> = Arc::from(vec![0u8, 1, 2, 3, 4, 5]);
        let dref = DataRef::from_borrowed(backing.clone(), 2..5).unwrap();
        assert_eq!(dref.size(), 3);
        assert_eq!(dref.get_data().unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn borrowed_out_of_range_errors() {
        let backing: Arc<[u8]> = Arc::from(vec![0u8; 4]);
        assert!(DataRef::from_borrowed(backing, 0..10).is_err());
    }

    #[test]
    fn file_backed_reads_the_right_slice() {
        let mut tmp = tempfile_like_buffer();
        use std::io::Write;
        tmp.write_all(b"hello world").unwrap();
        let file = Arc::new(Mutex::new(tmp));
        let dref = DataRef::from_file(file, 6, 5);
        assert_eq!(dref.get_data().unwrap(), b"world");
    }

    fn tempfile_like_buffer() -> File {
        let path = std::env::temp_dir().join(format!("mkremux-dataref-test-{:?}", std::thread::current().id()));
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .unwrap()
    }
}
