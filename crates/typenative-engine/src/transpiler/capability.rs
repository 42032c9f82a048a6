//! Standard library capabilities required by emitted code
//!
//! Lowering rules register the Go packages they reference. The set only
//! grows during a run and is turned into the import block once at assembly.

use std::collections::BTreeSet;

/// One Go standard library package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Errors,
    Fmt,
    Math,
    Rand,
    Os,
    Regexp,
    Strconv,
    Strings,
    Time,
}

impl Capability {
    /// Import path of the package
    pub fn import_path(self) -> &'static str {
        match self {
            Capability::Errors => "errors",
            Capability::Fmt => "fmt",
            Capability::Math => "math",
            Capability::Rand => "math/rand",
            Capability::Os => "os",
            Capability::Regexp => "regexp",
            Capability::Strconv => "strconv",
            Capability::Strings => "strings",
            Capability::Time => "time",
        }
    }

    /// Name the package is referenced by in code
    pub fn package_name(self) -> &'static str {
        match self {
            Capability::Rand => "rand",
            other => other.import_path(),
        }
    }

    pub const ALL: [Capability; 9] = [
        Capability::Errors,
        Capability::Fmt,
        Capability::Math,
        Capability::Rand,
        Capability::Os,
        Capability::Regexp,
        Capability::Strconv,
        Capability::Strings,
        Capability::Time,
    ];
}

/// Write-once-grow set of capabilities
#[derive(Debug, Default, Clone)]
pub struct Capabilities {
    required: BTreeSet<Capability>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, capability: Capability) {
        if self.required.insert(capability) {
            tracing::trace!(package = capability.import_path(), "capability required");
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.required.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Consume the set into a gofmt-sorted import block
    pub fn into_import_block(self) -> Option<String> {
        if self.required.is_empty() {
            return None;
        }
        let mut paths: Vec<&str> = self.required.iter().map(|c| c.import_path()).collect();
        paths.sort_unstable();

        let mut block = String::from("import (\n");
        for path in paths {
            block.push_str(&format!("\"{}\"\n", path));
        }
        block.push(')');
        Some(block)
    }
}
