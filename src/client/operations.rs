//! [`Authorizer`] implementation for [`Client`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{Instrument, debug, error, instrument, warn};

use super::Client;
use crate::authorizer::{Authorizer, ResultStream};
use crate::transport::{
    BulkCheckOutcome, LookupResourcesRequest, PermissionTree, Permissionship,
    ReadRelationshipsRequest, RelationshipFilter, RelationshipUpdate, SubjectFilter,
};
use crate::types::{
    Access, CheckRequest, Consistency, ObjectId, ObjectRef, Pagination, RelationUpdateRequest,
    ResourcesRequest, ResourcesWithRelations, SubjectRef, SubjectsWithRelations,
};
use crate::{Error, Result};

#[async_trait::async_trait]
impl Authorizer for Client {
    #[instrument(skip(self, request), fields(request = %request))]
    async fn check(&self, request: &CheckRequest, consistency: Consistency) -> Result<Access> {
        let permissionship = self.transport().check_permission(request, consistency).await?;
        let access = match permissionship {
            Permissionship::HasPermission => Access::Allow,
            Permissionship::NoPermission => Access::Forbid,
            Permissionship::Conditional | Permissionship::Unspecified => Access::Undefined,
        };
        debug!(%access, "check complete");
        Ok(access)
    }

    #[instrument(skip(self, requests), fields(requests = requests.len()))]
    async fn check_many(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<HashMap<CheckRequest, Access>> {
        if requests.is_empty() {
            return Ok(HashMap::new());
        }

        // Every key starts out forbidden so omitted pairs still get an answer.
        let mut results: HashMap<CheckRequest, Access> =
            requests.iter().map(|request| (request.clone(), Access::Forbid)).collect();

        for pair in self.transport().bulk_check(requests, consistency).await? {
            match (results.get_mut(&pair.request), pair.outcome) {
                (None, _) => {
                    debug!(request = %pair.request, "ignoring unrequested bulk check pair");
                }
                (Some(access), BulkCheckOutcome::Permissionship(Permissionship::HasPermission)) => {
                    *access = Access::Allow;
                }
                (Some(_), BulkCheckOutcome::Permissionship(_)) => {}
                (Some(_), BulkCheckOutcome::Error(message)) => {
                    warn!(request = %pair.request, error = %message, "bulk check item failed");
                }
            }
        }

        let allowed = results.values().filter(|access| access.is_allowed()).count();
        debug!(allowed, "bulk check complete");
        Ok(results)
    }

    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    async fn update(&self, updates: &[RelationUpdateRequest]) -> Result<()> {
        let batch = updates
            .iter()
            .map(|update| {
                Ok(RelationshipUpdate {
                    operation: update.require_update_type()?,
                    relationship: update.relationship(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if batch.is_empty() {
            return Ok(());
        }

        let response = self.transport().write_relationships(batch).await?;
        let written_at = response
            .written_at
            .ok_or_else(|| Error::invalid_response("write response carried no written_at token"))?;
        debug!(written_at = %written_at, "relationships written");
        Ok(())
    }

    fn relations_stream<'a>(
        &'a self,
        resource: &'a ObjectRef,
        subject: &'a SubjectRef,
        pagination: Pagination,
    ) -> ResultStream<'a, String> {
        let request = ReadRelationshipsRequest {
            filter: exact_filter(resource, None, subject),
            consistency: self.inner.read_consistency,
            pagination,
        };
        self.transport()
            .read_relationships(request)
            .map_ok(|item| item.relationship.relation().to_owned())
            .boxed()
    }

    #[instrument(skip(self, resource, subject), fields(resource = %resource, subject = %subject))]
    async fn check_relation(
        &self,
        resource: &ObjectRef,
        relation: &str,
        subject: &SubjectRef,
    ) -> Result<bool> {
        let request = ReadRelationshipsRequest {
            filter: exact_filter(resource, Some(relation), subject),
            consistency: self.inner.read_consistency,
            pagination: Pagination::default(),
        };
        let mut relationships = self.transport().read_relationships(request);
        while let Some(item) = relationships.try_next().await? {
            if item.relationship.relation() == relation {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn resources_stream<'a>(
        &'a self,
        request: &'a ResourcesRequest,
        pagination: Pagination,
    ) -> ResultStream<'a, String> {
        let lookup = LookupResourcesRequest {
            request: request.clone(),
            consistency: self.inner.read_consistency,
            pagination,
        };
        self.transport()
            .lookup_resources(lookup)
            .map_ok(|item| item.resource_id)
            .boxed()
    }

    #[instrument(skip(self, requests, pagination), fields(requests = requests.len()))]
    async fn resources_many(
        &self,
        requests: &[ResourcesRequest],
        pagination: Pagination,
    ) -> HashMap<ResourcesRequest, Vec<String>> {
        let deadline = tokio::time::Instant::now() + self.inner.lookup_timeout;

        let mut seen = HashSet::new();
        let tasks: Vec<_> = requests
            .iter()
            .filter(|request| seen.insert(*request))
            .map(|request| {
                let transport = Arc::clone(&self.inner.transport);
                let lookup = LookupResourcesRequest {
                    request: request.clone(),
                    consistency: self.inner.read_consistency,
                    pagination: pagination.clone(),
                };
                let handle = tokio::spawn(
                    async move {
                        transport
                            .lookup_resources(lookup)
                            .map_ok(|item| item.resource_id)
                            .try_collect::<Vec<_>>()
                            .await
                    }
                    .in_current_span(),
                );
                (request.clone(), handle)
            })
            .collect();

        let mut results = HashMap::with_capacity(tasks.len());
        for (request, mut handle) in tasks {
            let ids = match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(ids))) => ids,
                Ok(Ok(Err(err))) => {
                    error!(request = ?request, error = %err, "resource lookup failed");
                    Vec::new()
                }
                Ok(Err(join_error)) => {
                    error!(request = ?request, error = %join_error, "resource lookup task did not complete");
                    Vec::new()
                }
                Err(_) => {
                    handle.abort();
                    error!(request = ?request, "resource lookup did not finish before the deadline");
                    Vec::new()
                }
            };
            results.insert(request, ids);
        }
        results
    }

    fn resources_with_relations_stream<'a>(
        &'a self,
        resource_type: &'a str,
        subject: &'a SubjectRef,
        relation: Option<&'a str>,
        pagination: Pagination,
    ) -> ResultStream<'a, ResourcesWithRelations> {
        let request = ReadRelationshipsRequest {
            filter: RelationshipFilter {
                resource_type: resource_type.to_owned(),
                resource_id: None,
                relation: relation.map(str::to_owned),
                subject: Some(subject_filter(subject)),
            },
            consistency: self.inner.read_consistency,
            pagination,
        };
        let scan = self.transport().read_relationships(request);

        stream::once(async move {
            scan.try_fold(BTreeMap::<String, BTreeSet<String>>::new(), |mut groups, item| async move {
                let rel = item.relationship;
                groups
                    .entry(rel.resource().object_id().to_owned())
                    .or_default()
                    .insert(rel.relation().to_owned());
                Ok(groups)
            })
            .await
        })
        .map_ok(|groups| {
            stream::iter(groups.into_iter().map(|(resource_id, relations)| {
                Ok(ResourcesWithRelations {
                    resource_id,
                    relations,
                })
            }))
        })
        .try_flatten()
        .boxed()
    }

    fn subjects_stream<'a>(
        &'a self,
        resource: &'a ObjectRef,
        permission: &'a str,
        subject_type: &'a str,
        consistency: Consistency,
    ) -> ResultStream<'a, String> {
        let transport = self.transport();
        stream::once(async move {
            let tree = transport
                .expand_permission_tree(resource, permission, consistency)
                .await?
                .ok_or_else(|| {
                    Error::invalid_response(format!(
                        "expand response for {}#{} carried no tree root",
                        resource, permission
                    ))
                })?;
            let mut ids = Vec::new();
            collect_subjects(&tree, subject_type, &mut ids);
            debug!(resource = %resource, permission, subjects = ids.len(), "permission tree expanded");
            Ok::<_, Error>(ids)
        })
        .map_ok(|ids| stream::iter(ids.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    fn subjects_with_relations_stream<'a>(
        &'a self,
        resource_type: &'a str,
        resource_id: Option<ObjectId>,
        subject_type: Option<&'a str>,
        pagination: Pagination,
    ) -> ResultStream<'a, SubjectsWithRelations> {
        let request = ReadRelationshipsRequest {
            filter: RelationshipFilter {
                resource_type: resource_type.to_owned(),
                resource_id: resource_id.map(ObjectId::into_string),
                relation: None,
                subject: subject_type.map(|subject_type| SubjectFilter {
                    subject_type: subject_type.to_owned(),
                    ..SubjectFilter::default()
                }),
            },
            consistency: self.inner.read_consistency,
            pagination,
        };
        let scan = self.transport().read_relationships(request);

        stream::once(async move {
            scan.try_fold(
                BTreeMap::<(String, String), BTreeSet<String>>::new(),
                |mut groups, item| async move {
                    let rel = item.relationship;
                    let subject = rel.subject();
                    groups
                        .entry((subject.object_type().to_owned(), subject.object_id().to_owned()))
                        .or_default()
                        .insert(rel.relation().to_owned());
                    Ok(groups)
                },
            )
            .await
        })
        .map_ok(|groups| {
            stream::iter(groups.into_iter().map(|((subject_type, subject_id), relations)| {
                Ok(SubjectsWithRelations {
                    subject_type,
                    subject_id,
                    relations,
                })
            }))
        })
        .try_flatten()
        .boxed()
    }
}

fn subject_filter(subject: &SubjectRef) -> SubjectFilter {
    SubjectFilter {
        subject_type: subject.object_type().to_owned(),
        subject_id: Some(subject.object_id().to_owned()),
        relation: subject.relation().map(str::to_owned),
    }
}

/// Filter matching tuples between exactly `resource` and `subject`.
fn exact_filter(resource: &ObjectRef, relation: Option<&str>, subject: &SubjectRef) -> RelationshipFilter {
    RelationshipFilter {
        resource_type: resource.object_type().to_owned(),
        resource_id: Some(resource.object_id().to_owned()),
        relation: relation.map(str::to_owned),
        subject: Some(subject_filter(subject)),
    }
}

/// Depth-first, left-to-right walk collecting leaf subjects of `subject_type`.
fn collect_subjects(tree: &PermissionTree, subject_type: &str, out: &mut Vec<String>) {
    match tree {
        PermissionTree::Leaf { subjects } => out.extend(
            subjects
                .iter()
                .filter(|subject| subject.object_type() == subject_type)
                .map(|subject| subject.object_id().to_owned()),
        ),
        PermissionTree::Intermediate { children } => {
            for child in children {
                collect_subjects(child, subject_type, out);
            }
        }
    }
}
