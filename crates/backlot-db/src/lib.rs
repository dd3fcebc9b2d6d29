//! Backlot database layer: one repository per aggregate, plus transaction
//! utilities and the trait seams services mock in tests. All queries are
//! runtime-bound (`query_as` + `bind`) against PostgreSQL.

pub mod db;
pub mod traits;

pub use db::asset::AssetRepository;
pub use db::batch::BatchRepository;
pub use db::collection::CollectionRepository;
pub use db::media_file::MediaFileRepository;
pub use db::mmif::MmifRepository;
pub use db::pipeline::PipelineRepository;
pub use db::run::RunRepository;
pub use db::transaction::TransactionGuard;
pub use traits::{MmifStore, RunStore};
