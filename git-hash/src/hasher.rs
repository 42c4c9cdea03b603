use crate::ObjectId;

/// A thin wrapper around the SHA-1 implementation used across the object
/// store, pack codec and transport layers. Kept as a single wrapper so a
/// future migration to a different digest (or a hardware-accelerated
/// implementation) touches one file.
#[derive(Default)]
pub struct Hasher(sha1::Sha1);

impl Hasher {
    /// Feed more bytes into the running digest.
    pub fn update(&mut self, data: &[u8]) {
        use sha1::Digest;
        self.0.update(data);
    }

    /// Finalize the digest and return the resulting id.
    pub fn digest(self) -> ObjectId {
        use sha1::Digest;
        let bytes = self.0.finalize();
        ObjectId::from_array(bytes.into())
    }
}
