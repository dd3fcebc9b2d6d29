mod retriever;

pub use retriever::{ArtifactRetriever, RetrievedArtifacts};
