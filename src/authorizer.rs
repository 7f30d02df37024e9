//! The authorization capability set.
//!
//! [`Authorizer`] is object-safe, so callers can hold a `&dyn Authorizer` or
//! `Arc<dyn Authorizer>` and swap the backend in tests. [`Client`](crate::Client)
//! is the implementation backed by SpiceDB.

use std::collections::HashMap;
use std::pin::Pin;

use futures::{Stream, TryStreamExt};

use crate::types::{
    Access, CheckRequest, Consistency, ObjectId, ObjectRef, Pagination, RelationUpdateRequest,
    RelationUpdateType, ResourcesRequest, ResourcesWithRelations, SubjectRef,
    SubjectsWithRelations,
};
use crate::{Error, Result};

/// A lazy stream of results borrowed from an [`Authorizer`].
///
/// Nothing is sent until the stream is first polled. Dropping the stream
/// stops the enumeration.
pub type ResultStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Permission checks, relationship writes and enumerations.
///
/// Every enumeration has a `*_stream` form and a collecting form; the
/// collecting forms are provided in terms of the streams.
///
/// ## Example
///
/// ```rust
/// use spicedb_facade::{Authorizer, CheckRequest, Consistency, Result};
///
/// async fn can_view(authz: &dyn Authorizer, user: u64, doc: u64) -> Result<bool> {
///     let request = CheckRequest::new("user", user, "document", doc, "view");
///     authz.is_allowed(&request, Consistency::default()).await
/// }
/// ```
#[async_trait::async_trait]
pub trait Authorizer: Send + Sync {
    // ------------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------------

    /// Checks a single permission.
    ///
    /// [`Access::Undefined`] is returned when the server gave no definitive
    /// answer, for example when a caveat could not be evaluated.
    async fn check(&self, request: &CheckRequest, consistency: Consistency) -> Result<Access>;

    /// Returns `true` iff [`check`](Self::check) answers [`Access::Allow`].
    async fn is_allowed(&self, request: &CheckRequest, consistency: Consistency) -> Result<bool> {
        Ok(self.check(request, consistency).await?.is_allowed())
    }

    /// Checks a batch of permissions in one round trip.
    ///
    /// Every requested key is present in the result. Keys the server does not
    /// report as allowed map to [`Access::Forbid`]. An empty batch returns an
    /// empty map without contacting the server.
    async fn check_many(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<HashMap<CheckRequest, Access>>;

    /// Boolean form of [`check_many`](Self::check_many).
    async fn is_allowed_many(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<HashMap<CheckRequest, bool>> {
        Ok(self
            .check_many(requests, consistency)
            .await?
            .into_iter()
            .map(|(request, access)| (request, access.is_allowed()))
            .collect())
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Applies relationship updates atomically.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) if
    ///   any update has no update type; nothing is sent in that case
    /// - [`ErrorKind::InvalidResponse`](crate::ErrorKind::InvalidResponse) if
    ///   the server does not acknowledge the write with a revision token
    async fn update(&self, updates: &[RelationUpdateRequest]) -> Result<()>;

    /// Writes the tuple `resource#relation@subject`, succeeding if it already exists.
    async fn grant(&self, resource: &ObjectRef, relation: &str, subject: &SubjectRef) -> Result<()> {
        let update = tagged_update(RelationUpdateType::Grant, resource, relation, subject);
        self.update(std::slice::from_ref(&update)).await
    }

    /// Deletes the tuple `resource#relation@subject`, succeeding if it is already absent.
    async fn revoke(&self, resource: &ObjectRef, relation: &str, subject: &SubjectRef) -> Result<()> {
        let update = tagged_update(RelationUpdateType::Revoke, resource, relation, subject);
        self.update(std::slice::from_ref(&update)).await
    }

    /// Applies a batch of grants. Every update must be tagged [`RelationUpdateType::Grant`].
    async fn grant_many(&self, updates: &[RelationUpdateRequest]) -> Result<()> {
        require_all(updates, RelationUpdateType::Grant)?;
        self.update(updates).await
    }

    /// Applies a batch of revokes. Every update must be tagged [`RelationUpdateType::Revoke`].
    async fn revoke_many(&self, updates: &[RelationUpdateRequest]) -> Result<()> {
        require_all(updates, RelationUpdateType::Revoke)?;
        self.update(updates).await
    }

    // ------------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------------

    /// Streams relation names between exactly `resource` and `subject`.
    fn relations_stream<'a>(
        &'a self,
        resource: &'a ObjectRef,
        subject: &'a SubjectRef,
        pagination: Pagination,
    ) -> ResultStream<'a, String>;

    /// Collecting form of [`relations_stream`](Self::relations_stream).
    async fn relations(
        &self,
        resource: &ObjectRef,
        subject: &SubjectRef,
        pagination: Pagination,
    ) -> Result<Vec<String>> {
        self.relations_stream(resource, subject, pagination).try_collect().await
    }

    /// Returns `true` iff the tuple `resource#relation@subject` is stored.
    ///
    /// Unlike [`check`](Self::check) this does not evaluate permissions.
    async fn check_relation(
        &self,
        resource: &ObjectRef,
        relation: &str,
        subject: &SubjectRef,
    ) -> Result<bool>;

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    /// Streams ids of resources on which the subject holds the permission.
    fn resources_stream<'a>(
        &'a self,
        request: &'a ResourcesRequest,
        pagination: Pagination,
    ) -> ResultStream<'a, String>;

    /// Collecting form of [`resources_stream`](Self::resources_stream).
    async fn resources(&self, request: &ResourcesRequest, pagination: Pagination) -> Result<Vec<String>> {
        self.resources_stream(request, pagination).try_collect().await
    }

    /// Runs several resource lookups concurrently under one deadline.
    ///
    /// The map holds one entry per distinct request. A lookup that fails or
    /// does not finish in time maps to an empty list and is logged; the batch
    /// itself never fails.
    async fn resources_many(
        &self,
        requests: &[ResourcesRequest],
        pagination: Pagination,
    ) -> HashMap<ResourcesRequest, Vec<String>>;

    /// Streams resources of `resource_type` related to `subject`, grouped by
    /// resource id. `relation` narrows the scan to one relation.
    ///
    /// The underlying scan is read to completion before the first item is
    /// yielded.
    fn resources_with_relations_stream<'a>(
        &'a self,
        resource_type: &'a str,
        subject: &'a SubjectRef,
        relation: Option<&'a str>,
        pagination: Pagination,
    ) -> ResultStream<'a, ResourcesWithRelations>;

    /// Collecting form of [`resources_with_relations_stream`](Self::resources_with_relations_stream).
    async fn resources_with_relations(
        &self,
        resource_type: &str,
        subject: &SubjectRef,
        relation: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<ResourcesWithRelations>> {
        self.resources_with_relations_stream(resource_type, subject, relation, pagination)
            .try_collect()
            .await
    }

    // ------------------------------------------------------------------------
    // Subjects
    // ------------------------------------------------------------------------

    /// Streams ids of subjects of `subject_type` that hold `permission` on
    /// `resource`, in depth-first order of the permission expansion tree.
    fn subjects_stream<'a>(
        &'a self,
        resource: &'a ObjectRef,
        permission: &'a str,
        subject_type: &'a str,
        consistency: Consistency,
    ) -> ResultStream<'a, String>;

    /// Collecting form of [`subjects_stream`](Self::subjects_stream).
    async fn subjects(
        &self,
        resource: &ObjectRef,
        permission: &str,
        subject_type: &str,
        consistency: Consistency,
    ) -> Result<Vec<String>> {
        self.subjects_stream(resource, permission, subject_type, consistency)
            .try_collect()
            .await
    }

    /// Streams subjects related to resources of `resource_type`, grouped by
    /// subject. `resource_id` and `subject_type` narrow the scan.
    ///
    /// The underlying scan is read to completion before the first item is
    /// yielded.
    fn subjects_with_relations_stream<'a>(
        &'a self,
        resource_type: &'a str,
        resource_id: Option<ObjectId>,
        subject_type: Option<&'a str>,
        pagination: Pagination,
    ) -> ResultStream<'a, SubjectsWithRelations>;

    /// Collecting form of [`subjects_with_relations_stream`](Self::subjects_with_relations_stream).
    async fn subjects_with_relations(
        &self,
        resource_type: &str,
        resource_id: Option<ObjectId>,
        subject_type: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<SubjectsWithRelations>> {
        self.subjects_with_relations_stream(resource_type, resource_id, subject_type, pagination)
            .try_collect()
            .await
    }
}

fn tagged_update(
    update_type: RelationUpdateType,
    resource: &ObjectRef,
    relation: &str,
    subject: &SubjectRef,
) -> RelationUpdateRequest {
    let update = RelationUpdateRequest::builder()
        .subject_type(subject.object_type())
        .subject_id(subject.object_id())
        .resource_type(resource.object_type())
        .resource_id(resource.object_id())
        .relation(relation)
        .update_type(update_type)
        .build();
    match subject.relation() {
        Some(subject_relation) => update.with_subject_relation(subject_relation),
        None => update,
    }
}

fn require_all(updates: &[RelationUpdateRequest], expected: RelationUpdateType) -> Result<()> {
    match updates.iter().find(|u| u.update_type() != Some(expected)) {
        Some(update) => Err(Error::invalid_argument(format!(
            "expected a {:?} update, got {:?} for {}",
            expected,
            update.update_type(),
            update.relationship()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::stream;
    use parking_lot::Mutex;

    use super::*;
    use crate::ErrorKind;

    /// Records updates and allows every check on even resource ids.
    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<RelationUpdateRequest>>,
    }

    #[async_trait::async_trait]
    impl Authorizer for Recorder {
        async fn check(&self, request: &CheckRequest, _: Consistency) -> Result<Access> {
            let even = request.resource_id().parse::<u64>().is_ok_and(|id| id % 2 == 0);
            Ok(if even { Access::Allow } else { Access::Forbid })
        }

        async fn check_many(
            &self,
            requests: &[CheckRequest],
            consistency: Consistency,
        ) -> Result<HashMap<CheckRequest, Access>> {
            let mut out = HashMap::new();
            for request in requests {
                out.insert(request.clone(), self.check(request, consistency).await?);
            }
            Ok(out)
        }

        async fn update(&self, updates: &[RelationUpdateRequest]) -> Result<()> {
            self.updates.lock().extend_from_slice(updates);
            Ok(())
        }

        fn relations_stream<'a>(
            &'a self,
            _: &'a ObjectRef,
            _: &'a SubjectRef,
            _: Pagination,
        ) -> ResultStream<'a, String> {
            Box::pin(stream::iter(vec![Ok("owner".to_owned()), Ok("viewer".to_owned())]))
        }

        async fn check_relation(&self, _: &ObjectRef, _: &str, _: &SubjectRef) -> Result<bool> {
            Ok(false)
        }

        fn resources_stream<'a>(
            &'a self,
            _: &'a ResourcesRequest,
            _: Pagination,
        ) -> ResultStream<'a, String> {
            Box::pin(stream::iter(vec![
                Ok("1".to_owned()),
                Err(Error::unavailable("gone")),
            ]))
        }

        async fn resources_many(
            &self,
            _: &[ResourcesRequest],
            _: Pagination,
        ) -> HashMap<ResourcesRequest, Vec<String>> {
            HashMap::new()
        }

        fn resources_with_relations_stream<'a>(
            &'a self,
            _: &'a str,
            _: &'a SubjectRef,
            _: Option<&'a str>,
            _: Pagination,
        ) -> ResultStream<'a, ResourcesWithRelations> {
            Box::pin(stream::empty())
        }

        fn subjects_stream<'a>(
            &'a self,
            _: &'a ObjectRef,
            _: &'a str,
            _: &'a str,
            _: Consistency,
        ) -> ResultStream<'a, String> {
            Box::pin(stream::empty())
        }

        fn subjects_with_relations_stream<'a>(
            &'a self,
            _: &'a str,
            _: Option<ObjectId>,
            _: Option<&'a str>,
            _: Pagination,
        ) -> ResultStream<'a, SubjectsWithRelations> {
            Box::pin(stream::empty())
        }
    }

    #[tokio::test]
    async fn test_is_allowed_collapses_access() {
        let authz: &dyn Authorizer = &Recorder::default();
        let even = CheckRequest::new("user", 1, "doc", 2, "view");
        let odd = CheckRequest::new("user", 1, "doc", 3, "view");

        assert!(authz.is_allowed(&even, Consistency::default()).await.unwrap());
        assert!(!authz.is_allowed(&odd, Consistency::default()).await.unwrap());

        let many = authz
            .is_allowed_many(&[even.clone(), odd.clone()], Consistency::default())
            .await
            .unwrap();
        assert_eq!(many.len(), 2);
        assert!(many[&even]);
        assert!(!many[&odd]);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_tag_their_updates() {
        let recorder = Recorder::default();
        let doc = ObjectRef::new("doc", 1);
        let members = SubjectRef::new("group", "eng").with_relation("member");

        recorder.grant(&doc, "viewer", &members).await.unwrap();
        recorder.revoke(&doc, "viewer", &members).await.unwrap();

        let updates = recorder.updates.lock();
        assert_eq!(updates[0].update_type(), Some(RelationUpdateType::Grant));
        assert_eq!(updates[1].update_type(), Some(RelationUpdateType::Revoke));
        assert_eq!(updates[0].subject_relation(), "member");
        assert_eq!(updates[0].relationship().to_string(), "doc:1#viewer@group:eng#member");
    }

    #[tokio::test]
    async fn test_grant_many_rejects_mixed_tags() {
        let recorder = Recorder::default();
        let updates = vec![
            RelationUpdateRequest::grant("user", 1, "doc", 1, "viewer"),
            RelationUpdateRequest::revoke("user", 2, "doc", 1, "viewer"),
        ];

        let err = recorder.grant_many(&updates).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = recorder.revoke_many(&updates).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(recorder.updates.lock().is_empty());

        recorder.grant_many(&updates[..1]).await.unwrap();
        assert_eq!(recorder.updates.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_collecting_forms_propagate_stream_errors() {
        let recorder = Recorder::default();
        let relations = recorder
            .relations(&ObjectRef::new("doc", 1), &SubjectRef::new("user", 1), Pagination::default())
            .await
            .unwrap();
        assert_eq!(relations, vec!["owner", "viewer"]);

        let request = ResourcesRequest::new("doc", "view", "user", 1);
        let err = recorder.resources(&request, Pagination::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
