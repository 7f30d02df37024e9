//! Mock transport implementation for testing.
//!
//! The mock keeps relationship tuples in memory and evaluates a permission
//! as "a tuple with that exact relation exists", which is enough to exercise
//! every facade code path without a SpiceDB instance. Hooks cover the
//! behaviors a real server exhibits only under failure: stalled or failing
//! lookups, omitted bulk-check pairs, missing write tokens, and scripted
//! expansion trees.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::{stream, StreamExt};
use parking_lot::RwLock;

use super::traits::{
    BulkCheckOutcome, BulkCheckPair, LookupResourcesItem, LookupResourcesRequest, PermissionTree,
    Permissionship, ReadRelationshipsItem, ReadRelationshipsRequest, RelationshipFilter,
    RelationshipUpdate, Transport, TransportClient, TransportStream, WriteResponse,
};
use crate::types::{
    CheckRequest, Consistency, Cursor, ObjectRef, RelationUpdateType, Relationship,
    ResourcesRequest, SubjectRef, ZedToken,
};
use crate::{Error, ErrorKind};

/// Mock transport for testing.
///
/// ```rust
/// use spicedb_facade::testing::MockTransport;
///
/// let mock = MockTransport::new();
/// mock.add_relationship("document:readme#viewer@user:alice".parse().unwrap());
/// assert_eq!(mock.relationships().len(), 1);
/// ```
pub struct MockTransport {
    state: Arc<MockState>,
}

/// Shared by the transport and the lazy streams it hands out.
struct MockState {
    /// Stored relationships, kept sorted so reads are deterministic.
    relationships: RwLock<BTreeSet<Relationship>>,
    /// Request counter.
    request_count: AtomicU64,
    /// Revision counter for write tokens.
    revision: AtomicU64,
    /// Failure to return from the next request.
    simulate_failure: RwLock<Option<Error>>,
    /// Lookups that never produce an item.
    stalled_lookups: RwLock<HashSet<ResourcesRequest>>,
    /// Lookups whose stream fails.
    failing_lookups: RwLock<HashSet<ResourcesRequest>>,
    /// Checks to leave out of bulk responses.
    omitted_bulk_pairs: RwLock<HashSet<CheckRequest>>,
    /// Checks answered as conditional on a caveat.
    conditional_checks: RwLock<HashSet<CheckRequest>>,
    /// Bulk checks answered with a per-item error.
    failing_bulk_pairs: RwLock<HashSet<CheckRequest>>,
    /// Scripted expansion results, keyed by resource and permission.
    expansions: RwLock<HashMap<(ObjectRef, String), Option<PermissionTree>>>,
    /// Whether writes report no `written_at` token.
    omit_write_token: AtomicBool,
    /// Schema returned by `read_schema`.
    schema: RwLock<String>,
    /// Consistency of the most recent request that carried one.
    last_consistency: RwLock<Option<Consistency>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        let state = MockState {
            relationships: RwLock::new(BTreeSet::new()),
            request_count: AtomicU64::new(0),
            revision: AtomicU64::new(0),
            simulate_failure: RwLock::new(None),
            stalled_lookups: RwLock::new(HashSet::new()),
            failing_lookups: RwLock::new(HashSet::new()),
            omitted_bulk_pairs: RwLock::new(HashSet::new()),
            conditional_checks: RwLock::new(HashSet::new()),
            failing_bulk_pairs: RwLock::new(HashSet::new()),
            expansions: RwLock::new(HashMap::new()),
            omit_write_token: AtomicBool::new(false),
            schema: RwLock::new(String::new()),
            last_consistency: RwLock::new(None),
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Sets a failure to return from the next request.
    pub fn set_failure(&self, error: Error) {
        *self.state.simulate_failure.write() = Some(error);
    }

    /// Clears any simulated failure.
    pub fn clear_failure(&self) {
        *self.state.simulate_failure.write() = None;
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> u64 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Adds a relationship to the mock store.
    pub fn add_relationship(&self, relationship: Relationship) {
        self.state.relationships.write().insert(relationship);
    }

    /// Returns a snapshot of the stored relationships.
    pub fn relationships(&self) -> Vec<Relationship> {
        self.state.relationships.read().iter().cloned().collect()
    }

    /// Clears all relationships.
    pub fn clear_relationships(&self) {
        self.state.relationships.write().clear();
    }

    /// Makes lookups for `request` hang forever.
    pub fn stall_lookup(&self, request: ResourcesRequest) {
        self.state.stalled_lookups.write().insert(request);
    }

    /// Makes lookups for `request` fail with `Unavailable`.
    pub fn fail_lookup(&self, request: ResourcesRequest) {
        self.state.failing_lookups.write().insert(request);
    }

    /// Leaves `request` out of bulk check responses.
    pub fn omit_from_bulk(&self, request: CheckRequest) {
        self.state.omitted_bulk_pairs.write().insert(request);
    }

    /// Answers `request` with a per-item error in bulk check responses.
    pub fn fail_in_bulk(&self, request: CheckRequest) {
        self.state.failing_bulk_pairs.write().insert(request);
    }

    /// Answers `request` as conditional on a caveat.
    pub fn set_conditional(&self, request: CheckRequest) {
        self.state.conditional_checks.write().insert(request);
    }

    /// Scripts the expansion result for a resource and permission.
    ///
    /// `None` simulates a response without a tree root.
    pub fn set_expansion(
        &self,
        resource: ObjectRef,
        permission: impl Into<String>,
        tree: Option<PermissionTree>,
    ) {
        self.state.expansions
            .write()
            .insert((resource, permission.into()), tree);
    }

    /// Makes writes report no `written_at` token.
    pub fn omit_write_token(&self, omit: bool) {
        self.state.omit_write_token.store(omit, Ordering::Relaxed);
    }

    /// Sets the schema returned by `read_schema`.
    pub fn set_schema(&self, schema: impl Into<String>) {
        *self.state.schema.write() = schema.into();
    }

    /// Returns the consistency of the most recent request that carried one.
    pub fn last_consistency(&self) -> Option<Consistency> {
        *self.state.last_consistency.read()
    }
}

impl MockState {
    /// Counts the request and returns any simulated failure.
    fn begin(&self, consistency: Option<Consistency>) -> Result<(), Error> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if consistency.is_some() {
            *self.last_consistency.write() = consistency;
        }
        match self.simulate_failure.write().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn permissionship(&self, request: &CheckRequest) -> Permissionship {
        if self.conditional_checks.read().contains(request) {
            return Permissionship::Conditional;
        }
        let granted = self.relationships.read().iter().any(|rel| {
            rel.resource() == request.resource()
                && rel.relation() == request.permission()
                && rel.subject() == request.subject()
        });
        if granted {
            Permissionship::HasPermission
        } else {
            Permissionship::NoPermission
        }
    }

    fn read_page(&self, request: ReadRelationshipsRequest) -> TransportStream<ReadRelationshipsItem> {
        if let Err(error) = self.begin(Some(request.consistency)) {
            return failed(error);
        }

        // The mock's cursor is the tuple string of the last item returned.
        let limit = request.pagination.limit.map_or(usize::MAX, |l| l as usize);
        let relationships = self.relationships.read();
        let matching: Vec<&Relationship> = relationships
            .iter()
            .filter(|rel| matches_filter(rel, &request.filter))
            .collect();
        let start = match &request.pagination.cursor {
            Some(cursor) => matching
                .iter()
                .position(|rel| rel.to_string() == cursor.token())
                .map_or(matching.len(), |i| i + 1),
            None => 0,
        };
        let items: Vec<_> = matching
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|rel| {
                Ok(ReadRelationshipsItem {
                    after_result_cursor: Some(Cursor::new(rel.to_string())),
                    relationship: rel.clone(),
                })
            })
            .collect();
        stream::iter(items).boxed()
    }

    fn lookup_page(&self, request: LookupResourcesRequest) -> TransportStream<LookupResourcesItem> {
        if let Err(error) = self.begin(Some(request.consistency)) {
            return failed(error);
        }
        if self.stalled_lookups.read().contains(&request.request) {
            return stream::pending().boxed();
        }
        if self.failing_lookups.read().contains(&request.request) {
            return failed(Error::unavailable(format!(
                "simulated lookup failure for {}",
                request.request.resource_type()
            )));
        }

        let lookup = &request.request;
        let after = request.pagination.cursor.map(|c| c.token().to_owned());
        let limit = request.pagination.limit.map_or(usize::MAX, |l| l as usize);
        let ids: BTreeSet<String> = self
            .relationships
            .read()
            .iter()
            .filter(|rel| {
                rel.resource().object_type() == lookup.resource_type()
                    && rel.relation() == lookup.permission()
                    && rel.subject() == lookup.subject()
            })
            .map(|rel| rel.resource().object_id().to_owned())
            .collect();
        let items: Vec<_> = ids
            .into_iter()
            .filter(|id| after.as_deref().is_none_or(|after| id.as_str() > after))
            .take(limit)
            .map(|id| {
                Ok(LookupResourcesItem {
                    after_result_cursor: Some(Cursor::new(id.clone())),
                    resource_id: id,
                })
            })
            .collect();
        stream::iter(items).boxed()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("relationships", &self.state.relationships.read().len())
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}

fn matches_filter(rel: &Relationship, filter: &RelationshipFilter) -> bool {
    let resource = rel.resource();
    if resource.object_type() != filter.resource_type {
        return false;
    }
    if filter.resource_id.as_deref().is_some_and(|id| resource.object_id() != id) {
        return false;
    }
    if filter.relation.as_deref().is_some_and(|r| rel.relation() != r) {
        return false;
    }
    match &filter.subject {
        None => true,
        Some(subject) => {
            let actual = rel.subject();
            actual.object_type() == subject.subject_type
                && subject.subject_id.as_deref().is_none_or(|id| actual.object_id() == id)
                && subject.relation.as_deref().is_none_or(|r| actual.relation() == Some(r))
        }
    }
}

fn failed<T: Send + 'static>(error: Error) -> TransportStream<T> {
    stream::once(async move { Err(error) }).boxed()
}

#[async_trait::async_trait]
impl TransportClient for MockTransport {
    async fn check_permission(
        &self,
        request: &CheckRequest,
        consistency: Consistency,
    ) -> Result<Permissionship, Error> {
        self.state.begin(Some(consistency))?;
        Ok(self.state.permissionship(request))
    }

    async fn bulk_check(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<Vec<BulkCheckPair>, Error> {
        self.state.begin(Some(consistency))?;

        let omitted = self.state.omitted_bulk_pairs.read();
        let failing = self.state.failing_bulk_pairs.read();
        Ok(requests
            .iter()
            .filter(|request| !omitted.contains(*request))
            .map(|request| BulkCheckPair {
                request: request.clone(),
                outcome: if failing.contains(request) {
                    BulkCheckOutcome::Error(format!("simulated failure for {}", request))
                } else {
                    BulkCheckOutcome::Permissionship(self.state.permissionship(request))
                },
            })
            .collect())
    }

    async fn write_relationships(
        &self,
        updates: Vec<RelationshipUpdate>,
    ) -> Result<WriteResponse, Error> {
        self.state.begin(None)?;

        let mut relationships = self.state.relationships.write();
        // Writes are atomic: reject the whole batch before applying any of it.
        for update in &updates {
            if update.operation == RelationUpdateType::Create
                && relationships.contains(&update.relationship)
            {
                return Err(Error::new(
                    ErrorKind::Conflict,
                    format!("relationship {} already exists", update.relationship),
                ));
            }
        }
        for update in updates {
            match update.operation {
                RelationUpdateType::Grant | RelationUpdateType::Create => {
                    relationships.insert(update.relationship);
                }
                RelationUpdateType::Revoke => {
                    relationships.remove(&update.relationship);
                }
            }
        }

        let revision = self.state.revision.fetch_add(1, Ordering::Relaxed) + 1;
        let written_at = if self.state.omit_write_token.load(Ordering::Relaxed) {
            None
        } else {
            Some(ZedToken::new(format!("mock-revision-{}", revision)))
        };
        Ok(WriteResponse { written_at })
    }

    fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> TransportStream<ReadRelationshipsItem> {
        let state = Arc::clone(&self.state);
        stream::once(async move { state.read_page(request) })
            .flatten()
            .boxed()
    }

    fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> TransportStream<LookupResourcesItem> {
        let state = Arc::clone(&self.state);
        stream::once(async move { state.lookup_page(request) })
            .flatten()
            .boxed()
    }

    async fn expand_permission_tree(
        &self,
        resource: &ObjectRef,
        permission: &str,
        consistency: Consistency,
    ) -> Result<Option<PermissionTree>, Error> {
        self.state.begin(Some(consistency))?;

        if let Some(tree) = self
            .state
            .expansions
            .read()
            .get(&(resource.clone(), permission.to_owned()))
        {
            return Ok(tree.clone());
        }

        let subjects: Vec<SubjectRef> = self
            .state
            .relationships
            .read()
            .iter()
            .filter(|rel| rel.resource() == resource && rel.relation() == permission)
            .map(|rel| rel.subject().clone())
            .collect();
        Ok(Some(PermissionTree::Leaf { subjects }))
    }

    async fn read_schema(&self) -> Result<String, Error> {
        self.state.begin(None)?;
        Ok(self.state.schema.read().clone())
    }

    fn transport_type(&self) -> Transport {
        Transport::Mock
    }
}
