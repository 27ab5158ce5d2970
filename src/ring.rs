//! Consistent Hash Ring
//!
//! Maps arbitrary keys to peer identifiers using virtual-node consistent
//! hashing. Each real peer is represented by `replicas` synthetic positions
//! on a sorted ring of hash values; a key resolves to the peer owning the
//! first ring position at or after the key's own hash, wrapping around at
//! the end. Virtual nodes smooth the key distribution across few peers and
//! bound the fraction of keys that move when membership changes to roughly
//! 1/N per peer added, versus a full reshuffle under modulo hashing.
//!
//! The ring is not internally synchronized. It is read-heavy after
//! construction; callers that mutate membership concurrently with lookups
//! must add external synchronization (see [`crate::api::HttpPool`]).

use ahash::AHashMap;

/// Hash strategy over raw bytes, injected at construction.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

// == Hash Ring ==
pub struct HashRing {
    /// Virtual nodes per real peer
    replicas: usize,
    /// Injected hash function (CRC-32/IEEE by default)
    hash: HashFn,
    /// Ascending sorted virtual-node hash values
    keys: Vec<u32>,
    /// Virtual-node hash to real peer identifier
    nodes: AHashMap<u32, String>,
}

impl HashRing {
    // == Constructors ==
    /// Creates an empty ring using CRC-32/IEEE as the hash function.
    ///
    /// # Panics
    /// Panics if `replicas` is zero.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Creates an empty ring with an injected hash function.
    ///
    /// # Panics
    /// Panics if `replicas` is zero.
    pub fn with_hasher(replicas: usize, hash: impl Fn(&[u8]) -> u32 + Send + Sync + 'static) -> Self {
        assert!(replicas >= 1, "ring requires at least one virtual node per peer");
        Self {
            replicas,
            hash: Box::new(hash),
            keys: Vec::new(),
            nodes: AHashMap::new(),
        }
    }

    // == Add ==
    /// Registers real peers, creating `replicas` virtual nodes for each.
    ///
    /// Virtual node `i` of a peer hashes the decimal index concatenated
    /// with the peer identifier. Re-adding an identifier appends further
    /// virtual nodes; duplicates are not deduplicated. The ring is
    /// re-sorted after all supplied peers are processed.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.keys.push(hash);
                self.nodes.insert(hash, peer.to_string());
            }
        }
        self.keys.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`, or `None` if the ring is empty.
    ///
    /// Binary-searches for the first virtual-node hash at or after the
    /// key's hash, wrapping to the smallest ring value when the key hashes
    /// beyond every registered position.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&k| k < hash);
        let ring_key = self.keys[idx % self.keys.len()];
        self.nodes.get(&ring_key).map(String::as_str)
    }

    // == Observers ==
    /// True if no peers have been registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of virtual nodes on the ring.
    pub fn virtual_nodes(&self) -> usize {
        self.keys.len()
    }
}
