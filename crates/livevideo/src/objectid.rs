use std::fmt;

// highest id still representable by the host's signed interface
const MAX_OBJECT_ID: u32 = i32::MAX as u32;

/// Process-unique name of a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn as_raw(&self) -> u32 {
        self.0
    }

    /// Convert a host-side id; negative values never name a resource.
    pub fn from_raw(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(ObjectId)
    }

    pub fn as_host(&self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing ids, starting at 0, never reissuing one.
///
/// Has no locking of its own: the registry only touches it while holding its lock.
#[derive(Debug, Default)]
pub struct ObjectIdAllocator {
    next: u32,
    exhausted: bool,
}

impl ObjectIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unused id, or `None` once every host-representable id was issued.
    pub fn next(&mut self) -> Option<ObjectId> {
        if self.exhausted {
            return None;
        }
        let id = ObjectId(self.next);
        if self.next == MAX_OBJECT_ID {
            self.exhausted = true;
        } else {
            self.next += 1;
        }
        Some(id)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next as u64 + self.exhausted as u64
    }

    #[cfg(test)]
    fn starting_at(next: u32) -> Self {
        Self {
            next,
            exhausted: false,
        }
    }
}
