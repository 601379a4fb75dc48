use std::fmt;

/// The four artifacts that make up one provisioning bundle.
///
/// A bundle is regenerated as a whole; an artifact counts as present only
/// when its file exists and is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Leaf certificate (`cert.pem`)
    Cert,
    /// Certificate private key (`key.pem`)
    Key,
    /// Delegated credential (`dc.cred`)
    DcCred,
    /// Delegated credential private key (`dckey.pem`)
    DcKey,
}

impl ArtifactKind {
    /// All bundle artifacts, in their fixed transfer order.
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Cert,
        ArtifactKind::Key,
        ArtifactKind::DcCred,
        ArtifactKind::DcKey,
    ];

    /// Fixed on-disk file name inside the artifact directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Cert => "cert.pem",
            ArtifactKind::Key => "key.pem",
            ArtifactKind::DcCred => "dc.cred",
            ArtifactKind::DcKey => "dckey.pem",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
