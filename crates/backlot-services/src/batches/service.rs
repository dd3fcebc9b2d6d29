//! Batch lifecycle operations
//!
//! Create-from-collection(s), duplicate, combine, start, and input-artifact
//! management. Each mutating operation is one read-modify-write transaction
//! against the relational store. Batch membership is a set: lifecycle
//! operations that copy or union memberships cannot double-count a media
//! file shared between sources.
//!
//! Authorization is not evaluated here; callers pass a precomputed
//! capability decision at the HTTP layer.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;

use backlot_core::models::{Batch, MediaFile, Mmif, PipelineApp};
use backlot_core::AppError;
use backlot_db::{
    BatchRepository, CollectionRepository, MediaFileRepository, MmifRepository,
    PipelineRepository, RunRepository, TransactionGuard,
};

use crate::events::EventPublisher;

/// Marker appended to a duplicated batch's name.
const DUPLICATE_NAME_MARKER: &str = " (copy)";

#[derive(Clone)]
pub struct BatchService {
    pool: PgPool,
    batches: BatchRepository,
    collections: CollectionRepository,
    media_files: MediaFileRepository,
    pipelines: PipelineRepository,
    mmifs: MmifRepository,
    runs: RunRepository,
    publisher: Arc<dyn EventPublisher>,
}

impl BatchService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        batches: BatchRepository,
        collections: CollectionRepository,
        media_files: MediaFileRepository,
        pipelines: PipelineRepository,
        mmifs: MmifRepository,
        runs: RunRepository,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            pool,
            batches,
            collections,
            media_files,
            pipelines,
            mmifs,
            runs,
            publisher,
        }
    }

    /// Resolve every GUID to an existing media file. Unresolvable GUIDs are
    /// collected and returned together in one aggregate validation error;
    /// the caller sees every problem at once.
    pub async fn validate_media_guids(&self, guids: &[String]) -> Result<Vec<MediaFile>, AppError> {
        let found = self
            .media_files
            .find_existing(guids)
            .await
            .map_err(AppError::from)?;
        let missing = missing_guids(guids, &found);
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }
        Ok(found)
    }

    /// Create a batch from an explicit, validated GUID list.
    #[tracing::instrument(skip(self, guids))]
    pub async fn create_new_batch(
        &self,
        guids: &[String],
        name: &str,
        description: &str,
    ) -> Result<Batch, AppError> {
        let media_files = self.validate_media_guids(guids).await?;
        let guids: Vec<String> = media_files.into_iter().map(|m| m.guid).collect();

        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let batch = self
            .batches
            .create_tx(&mut tx, name, description, None)
            .await?;
        self.batches.add_media_tx(&mut tx, batch.id, &guids).await?;
        tx.commit().await?;

        tracing::info!(batch_id = batch.id, members = guids.len(), "Created batch");
        Ok(batch)
    }

    /// Union the media-file sets of the named collections into one new batch.
    #[tracing::instrument(skip(self))]
    pub async fn create_batch_from_collections(
        &self,
        collection_ids: &[i32],
    ) -> Result<Batch, AppError> {
        let collections = self.fetch_collections(collection_ids).await?;

        let mut memberships = Vec::with_capacity(collections.len());
        for collection in &collections {
            memberships.push(self.collections.media_guids(collection.id).await?);
        }
        let guids = union_membership(memberships);

        let names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
        let name = format!("Batch from {}", names.join(" + "));
        let description = format!("Created from collections: {}", names.join(", "));

        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let batch = self
            .batches
            .create_tx(&mut tx, &name, &description, None)
            .await?;
        self.batches.add_media_tx(&mut tx, batch.id, &guids).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// One new batch per collection (1:1), not a union.
    #[tracing::instrument(skip(self))]
    pub async fn create_batch_per_collection(
        &self,
        collection_ids: &[i32],
    ) -> Result<Vec<Batch>, AppError> {
        let collections = self.fetch_collections(collection_ids).await?;

        let mut created = Vec::with_capacity(collections.len());
        for collection in collections {
            let guids = self.collections.media_guids(collection.id).await?;
            let name = format!("Batch from {}", collection.name);

            let mut tx = TransactionGuard::begin(&self.pool).await?;
            let batch = self
                .batches
                .create_tx(&mut tx, &name, &collection.description, None)
                .await?;
            self.batches.add_media_tx(&mut tx, batch.id, &guids).await?;
            tx.commit().await?;
            created.push(batch);
        }
        Ok(created)
    }

    /// Copy all scalar attributes except the id, append the copy marker to
    /// the name, and copy the media-file set by reference. Both batches
    /// share membership independently afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn duplicate_batch(&self, batch_id: i32) -> Result<Batch, AppError> {
        let source = self.get_batch(batch_id).await?;
        let guids = self.batches.media_guids(batch_id).await?;

        let name = format!("{}{}", source.name, DUPLICATE_NAME_MARKER);
        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let batch = self
            .batches
            .create_tx(&mut tx, &name, &source.description, source.pipeline_id)
            .await?;
        self.batches.add_media_tx(&mut tx, batch.id, &guids).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// One new batch whose media-file set is the union of all source
    /// batches' sets. Membership is set-based: a media file present in two
    /// sources appears once in the result.
    #[tracing::instrument(skip(self))]
    pub async fn combine_batches(&self, batch_ids: &[i32]) -> Result<Batch, AppError> {
        let sources = self.fetch_batches(batch_ids).await?;

        let mut memberships = Vec::with_capacity(sources.len());
        for source in &sources {
            memberships.push(self.batches.media_guids(source.id).await?);
        }
        let guids = union_membership(memberships);

        let name = format!("Combination of {} batches", sources.len());
        let names: Vec<&str> = sources.iter().map(|b| b.name.as_str()).collect();
        let description = format!("Combined from: {}", names.join(", "));

        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let batch = self
            .batches
            .create_tx(&mut tx, &name, &description, None)
            .await?;
        self.batches.add_media_tx(&mut tx, batch.id, &guids).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// Dispatch a batch: publish one event per member media file carrying
    /// the batch id, the guid, the pipeline's app endpoints in pipeline
    /// order, and the resolved input artifact location.
    ///
    /// The first publish failure aborts the remaining publishes and
    /// surfaces to the caller; already-published events are not recalled.
    #[tracing::instrument(skip(self))]
    pub async fn start_batch(
        &self,
        batch_id: i32,
        start_from_blank: bool,
    ) -> Result<usize, AppError> {
        let batch = self.get_batch(batch_id).await?;
        let pipeline_id = batch
            .pipeline_id
            .ok_or_else(|| AppError::BadRequest(format!("Batch {} has no pipeline", batch.id)))?;
        let apps = self.pipelines.apps_in_order(pipeline_id).await?;
        if apps.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Pipeline {} has no apps",
                pipeline_id
            )));
        }
        let endpoints = joined_endpoints(&apps);

        let guids = self.batches.media_guids(batch_id).await?;
        let declared_inputs = declared_inputs_by_guid(self.batches.input_mmifs(batch_id).await?);

        let mut items = Vec::with_capacity(guids.len());
        for guid in guids {
            let declared = declared_inputs.get(&guid);
            let latest = if start_from_blank || declared.is_some() {
                None
            } else {
                self.mmifs.latest_for_media_file(&guid).await?
            };
            let mmif_location = resolve_mmif_input(start_from_blank, declared, latest.as_ref());
            items.push((guid, mmif_location));
        }

        let published =
            publish_start_events(self.publisher.as_ref(), batch.id, &endpoints, &items).await?;
        tracing::info!(batch_id, published, "Started batch");
        Ok(published)
    }

    /// GUIDs of batch members that have no run scoped to this batch yet.
    pub async fn unstarted_guids(&self, batch_id: i32) -> Result<Vec<String>, AppError> {
        let batch = self.get_batch(batch_id).await?;
        let members = self.batches.media_guids(batch.id).await?;
        let started = self.runs.guids_with_runs(batch.id).await?;
        Ok(unstarted(&members, &started))
    }

    /// Declare artifacts as inputs of a batch. An input artifact must not
    /// duplicate a media file already covered by another input of the same
    /// batch; every duplicated media file is reported in one aggregate
    /// validation error.
    #[tracing::instrument(skip(self))]
    pub async fn attach_input_mmifs(
        &self,
        batch_id: i32,
        mmif_ids: &[i32],
    ) -> Result<usize, AppError> {
        let batch = self.get_batch(batch_id).await?;

        let mmifs = self.mmifs.get_many(mmif_ids).await?;
        let found: BTreeSet<i32> = mmifs.iter().map(|m| m.id).collect();
        let missing: Vec<String> = mmif_ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "MMIFs not found: {}",
                missing.join(", ")
            )));
        }

        let existing = self.batches.input_mmifs(batch.id).await?;
        let duplicates = duplicate_input_guids(&existing, &mmifs);
        if !duplicates.is_empty() {
            return Err(AppError::Validation(duplicates));
        }

        let ids: Vec<i32> = mmifs.iter().map(|m| m.id).collect();
        let mut tx = TransactionGuard::begin(&self.pool).await?;
        let attached = self
            .batches
            .attach_input_mmifs_tx(&mut tx, batch.id, &ids)
            .await?;
        tx.commit().await?;
        Ok(attached as usize)
    }

    async fn get_batch(&self, batch_id: i32) -> Result<Batch, AppError> {
        self.batches
            .get(batch_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))
    }

    async fn fetch_batches(&self, ids: &[i32]) -> Result<Vec<Batch>, AppError> {
        let batches = self.batches.get_many(ids).await?;
        let found: BTreeSet<i32> = batches.iter().map(|b| b.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Batches not found: {}",
                missing.join(", ")
            )));
        }
        Ok(batches)
    }

    async fn fetch_collections(
        &self,
        ids: &[i32],
    ) -> Result<Vec<backlot_core::models::Collection>, AppError> {
        let collections = self.collections.get_many(ids).await?;
        let found: BTreeSet<i32> = collections.iter().map(|c| c.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Collections not found: {}",
                missing.join(", ")
            )));
        }
        Ok(collections)
    }
}

/// Publish one dispatch event per media file. The first publish failure
/// aborts the remaining publishes; events already on the bus stay published
/// with no compensating action.
pub async fn publish_start_events(
    publisher: &dyn EventPublisher,
    batch_id: i32,
    endpoints: &str,
    items: &[(String, Option<String>)],
) -> Result<usize, AppError> {
    let mut published = 0usize;
    for (guid, mmif_location) in items {
        let payload = json!({
            "batch_id": batch_id,
            "guid": guid,
            "pipeline": endpoints,
            "mmif_location": mmif_location,
        });
        publisher.publish("pipeline", payload).await?;
        published += 1;
    }
    Ok(published)
}

/// Set-union of several batch or collection memberships: a media file
/// present in more than one source appears exactly once.
pub fn union_membership(memberships: Vec<Vec<String>>) -> Vec<String> {
    let mut union = BTreeSet::new();
    for membership in memberships {
        union.extend(membership);
    }
    union.into_iter().collect()
}

/// Input GUIDs with no matching media file, in input order, deduplicated.
fn missing_guids(requested: &[String], found: &[MediaFile]) -> Vec<String> {
    let known: BTreeSet<&str> = found.iter().map(|m| m.guid.as_str()).collect();
    let mut seen = BTreeSet::new();
    requested
        .iter()
        .filter(|g| !known.contains(g.as_str()) && seen.insert(g.as_str()))
        .cloned()
        .collect()
}

/// Comma-joined app endpoint URLs, in pipeline-defined order.
fn joined_endpoints(apps: &[PipelineApp]) -> String {
    apps.iter()
        .map(|a| a.endpoint.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Index a batch's declared input artifacts by media-file GUID. The attach
/// invariant keeps this at most one per GUID.
fn declared_inputs_by_guid(inputs: Vec<Mmif>) -> HashMap<String, Mmif> {
    let mut by_guid = HashMap::new();
    for mmif in inputs {
        by_guid.entry(mmif.media_file_guid.clone()).or_insert(mmif);
    }
    by_guid
}

/// Input-artifact precedence for one media file: starting from blank wins
/// over everything; otherwise a batch-declared input wins over the media
/// file's own latest artifact. A declared input without a stored location
/// yields no location rather than falling through.
fn resolve_mmif_input(
    start_from_blank: bool,
    declared: Option<&Mmif>,
    latest: Option<&Mmif>,
) -> Option<String> {
    if start_from_blank {
        return None;
    }
    match declared {
        Some(mmif) => mmif.location.clone(),
        None => latest.and_then(|m| m.location.clone()),
    }
}

/// Members with no run yet, preserving membership order.
fn unstarted(members: &[String], started: &[String]) -> Vec<String> {
    let started: BTreeSet<&str> = started.iter().map(|s| s.as_str()).collect();
    members
        .iter()
        .filter(|g| !started.contains(g.as_str()))
        .cloned()
        .collect()
}

/// Media files that would be covered by more than one input artifact of the
/// same batch, considering both already-attached and newly-requested
/// artifacts. Artifacts already attached are ignored on re-attach.
fn duplicate_input_guids(existing: &[Mmif], new: &[Mmif]) -> Vec<String> {
    let attached_ids: BTreeSet<i32> = existing.iter().map(|m| m.id).collect();
    let mut covered: BTreeSet<&str> = existing.iter().map(|m| m.media_file_guid.as_str()).collect();

    let mut duplicates = BTreeSet::new();
    for mmif in new.iter().filter(|m| !attached_ids.contains(&m.id)) {
        if !covered.insert(mmif.media_file_guid.as_str()) {
            duplicates.insert(mmif.media_file_guid.clone());
        }
    }
    duplicates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn media_file(guid: &str) -> MediaFile {
        MediaFile {
            guid: guid.to_string(),
            created_at: Utc::now(),
        }
    }

    fn mmif(id: i32, guid: &str, location: Option<&str>) -> Mmif {
        Mmif {
            id,
            created_at: Utc::now(),
            media_file_guid: guid.to_string(),
            run_id: None,
            batch_output_id: None,
            location: location.map(|s| s.to_string()),
        }
    }

    fn app(id: i32, endpoint: &str) -> PipelineApp {
        PipelineApp {
            id,
            name: format!("app-{}", id),
            endpoint: endpoint.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_missing_guids_reports_every_unknown_guid() {
        let requested = vec![
            "g1".to_string(),
            "missing1".to_string(),
            "missing2".to_string(),
        ];
        let found = vec![media_file("g1")];
        assert_eq!(missing_guids(&requested, &found), vec!["missing1", "missing2"]);
    }

    #[test]
    fn test_missing_guids_empty_when_all_resolve() {
        let requested = vec!["g1".to_string(), "g2".to_string()];
        let found = vec![media_file("g1"), media_file("g2")];
        assert!(missing_guids(&requested, &found).is_empty());
    }

    #[test]
    fn test_joined_endpoints_preserves_pipeline_order() {
        let apps = vec![
            app(1, "http://slate-detector:5000"),
            app(2, "http://whisper:5000"),
        ];
        assert_eq!(
            joined_endpoints(&apps),
            "http://slate-detector:5000,http://whisper:5000"
        );
    }

    #[test]
    fn test_resolve_mmif_blank_ignores_all_artifacts() {
        let declared = mmif(1, "g1", Some("mmif/1.json"));
        let latest = mmif(2, "g1", Some("mmif/2.json"));
        assert_eq!(
            resolve_mmif_input(true, Some(&declared), Some(&latest)),
            None
        );
    }

    #[test]
    fn test_resolve_mmif_prefers_declared_input_over_latest() {
        let declared = mmif(1, "g1", Some("mmif/declared.json"));
        let latest = mmif(2, "g1", Some("mmif/latest.json"));
        assert_eq!(
            resolve_mmif_input(false, Some(&declared), Some(&latest)),
            Some("mmif/declared.json".to_string())
        );
    }

    #[test]
    fn test_resolve_mmif_falls_back_to_latest() {
        let latest = mmif(2, "g1", Some("mmif/latest.json"));
        assert_eq!(
            resolve_mmif_input(false, None, Some(&latest)),
            Some("mmif/latest.json".to_string())
        );
        assert_eq!(resolve_mmif_input(false, None, None), None);
    }

    #[test]
    fn test_resolve_mmif_declared_without_location_yields_none() {
        let declared = mmif(1, "g1", None);
        let latest = mmif(2, "g1", Some("mmif/latest.json"));
        assert_eq!(
            resolve_mmif_input(false, Some(&declared), Some(&latest)),
            None
        );
    }

    #[test]
    fn test_unstarted_is_set_difference_in_member_order() {
        let members = vec!["g1".to_string(), "g2".to_string(), "g3".to_string()];
        let started = vec!["g2".to_string()];
        assert_eq!(unstarted(&members, &started), vec!["g1", "g3"]);
        assert!(unstarted(&members, &members).is_empty());
    }

    #[test]
    fn test_duplicate_input_guids_against_existing_inputs() {
        let existing = vec![mmif(1, "g1", None)];
        let new = vec![mmif(2, "g1", None), mmif(3, "g2", None)];
        assert_eq!(duplicate_input_guids(&existing, &new), vec!["g1"]);
    }

    #[test]
    fn test_duplicate_input_guids_within_new_set() {
        let new = vec![mmif(2, "g2", None), mmif(3, "g2", None), mmif(4, "g3", None)];
        assert_eq!(duplicate_input_guids(&[], &new), vec!["g2"]);
    }

    #[test]
    fn test_duplicate_input_guids_ignores_reattach_of_same_mmif() {
        let existing = vec![mmif(1, "g1", None)];
        let new = vec![mmif(1, "g1", None)];
        assert!(duplicate_input_guids(&existing, &new).is_empty());
    }

    #[test]
    fn test_union_membership_is_set_based() {
        // A media file shared by two sources appears once in the result.
        let memberships = vec![
            vec!["g1".to_string(), "g2".to_string()],
            vec!["g2".to_string(), "g3".to_string()],
        ];
        assert_eq!(union_membership(memberships), vec!["g1", "g2", "g3"]);
    }
}
