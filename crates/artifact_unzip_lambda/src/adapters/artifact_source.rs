use std::io::Write;

use crate::runtime::contract::SourceArtifactRef;

/// Read access to input artifacts. Implementations must authenticate with the
/// credentials carried by the artifact reference, never the ambient identity.
pub trait ArtifactSource {
    fn download_to(&self, artifact: &SourceArtifactRef, sink: &mut dyn Write)
        -> Result<u64, String>;
}
