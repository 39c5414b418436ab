//! Payload types and scale factors for benchmarks.

use herald::impl_payload;

/// Scale factor for benchmark setup.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 observers per name.
    Tiny,
    /// 100 observers per name.
    #[default]
    Small,
    /// 1,000 observers per name.
    Medium,
}

impl Scale {
    /// Observers registered per notification name.
    pub fn observers(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 1_000,
        }
    }

    /// Label used in benchmark IDs.
    pub fn label(&self) -> &'static str {
        match self {
            Scale::Tiny => "tiny",
            Scale::Small => "small",
            Scale::Medium => "medium",
        }
    }
}

/// Base payload type.
#[derive(Debug, Clone)]
pub struct Animal {
    pub name: String,
}

/// Payload subtype of [`Animal`].
#[derive(Debug, Clone)]
pub struct Cat {
    pub animal: Animal,
    pub lives: u8,
}

impl_payload!(Animal);
impl_payload!(Cat => animal);

impl Cat {
    pub fn new(name: &str) -> Self {
        Self {
            animal: Animal {
                name: name.to_string(),
            },
            lives: 9,
        }
    }
}
