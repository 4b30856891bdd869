/// Byte-oriented buffers with incremental append operations
///
/// In most ways, it is convenient to think of `Target` as an analogous trait to
/// [`std::io::Write`]. The principal difference between the two is the fact
/// that the `push_XXX` methods on `Target` are infallible and total; the `usize`
/// they return is used only for book-keeping on the caller side.
pub trait Target {
    /// Reserves room for at least `extra` further bytes, where meaningful.
    fn anticipate(&mut self, extra: usize);

    /// Appends a single byte, returning `1`.
    fn push_one(&mut self, b: u8) -> usize;

    /// Appends the bytes in a known-length array, returning `N`.
    ///
    /// ```ignore
    /// x.push_many(*b"ab") === x.push_one(b'a') + x.push_one(b'b')
    /// ```
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    /// Appends the bytes of an arbitrary-length slice, returning its length.
    fn push_all(&mut self, buf: &[u8]) -> usize;
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.extend_from_slice(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_match_contents() {
        let mut buf: Vec<u8> = Vec::new();
        buf.anticipate(6);
        let n = buf.push_one(1) + buf.push_many([2, 3]) + buf.push_all(&[4, 5, 6]);
        assert_eq!(n, buf.len());
        assert_eq!(buf, vec![1, 2, 3, 4, 5, 6]);
    }
}
