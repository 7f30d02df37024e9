//! gRPC transport implementation using tonic.
//!
//! Calls go through the generated clients of the `spicedb-grpc` crate over a
//! single lazily connected [`Channel`]. Every request carries the preshared
//! key as a bearer token, on plaintext and TLS channels alike.

use std::time::Duration;

use futures::{future, stream, StreamExt, TryStreamExt};
use spicedb_grpc::authzed::api::v1 as proto;
use spicedb_grpc::authzed::api::v1::{
    check_bulk_permissions_pair, check_permission_response, consistency::Requirement,
    permission_relationship_tree::TreeType, permissions_service_client::PermissionsServiceClient,
    relationship_update, schema_service_client::SchemaServiceClient,
};
use tonic::metadata::AsciiMetadataValue;
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, TlsConfig};
use crate::transport::traits::{
    BulkCheckOutcome, BulkCheckPair, LookupResourcesItem, LookupResourcesRequest, PermissionTree,
    Permissionship, ReadRelationshipsItem, ReadRelationshipsRequest, RelationshipFilter,
    RelationshipUpdate, Transport, TransportClient, TransportStream, WriteResponse,
};
use crate::types::{
    CheckRequest, Consistency, Cursor, ObjectRef, Pagination, RelationUpdateType, Relationship,
    SubjectRef, ZedToken,
};
use crate::Error;

/// Attaches `authorization: Bearer <token>` to every request.
#[derive(Clone)]
pub(crate) struct BearerToken {
    header: AsciiMetadataValue,
}

impl BearerToken {
    fn new(token: &str) -> Result<Self, Error> {
        let header = format!("Bearer {}", token)
            .parse::<AsciiMetadataValue>()
            .map_err(|_| Error::configuration("token contains characters not allowed in a header"))?;
        Ok(Self { header })
    }
}

impl Interceptor for BearerToken {
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, tonic::Status> {
        request.metadata_mut().insert("authorization", self.header.clone());
        Ok(request)
    }
}

type AuthedChannel = InterceptedService<Channel, BearerToken>;

/// gRPC transport client for SpiceDB.
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Clone)]
pub struct GrpcTransport {
    permissions: PermissionsServiceClient<AuthedChannel>,
    schema: SchemaServiceClient<AuthedChannel>,
}

impl GrpcTransport {
    /// Returns a builder for configuring the gRPC transport.
    ///
    /// `endpoint` must carry an `http` or `https` scheme; `https` enables TLS.
    pub fn builder(endpoint: Url, token: impl Into<String>) -> GrpcTransportBuilder {
        GrpcTransportBuilder {
            endpoint,
            token: token.into(),
            tls_config: TlsConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for GrpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcTransport").finish_non_exhaustive()
    }
}

/// Builder for configuring a gRPC transport.
pub struct GrpcTransportBuilder {
    endpoint: Url,
    token: String,
    tls_config: TlsConfig,
    timeout: Duration,
    connect_timeout: Duration,
}

impl GrpcTransportBuilder {
    /// Sets the TLS configuration, used for `https` endpoints.
    #[must_use]
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = config;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builds the transport.
    ///
    /// The channel connects on first use, so this does not fail when
    /// SpiceDB is unreachable.
    pub fn build(self) -> Result<GrpcTransport, Error> {
        let origin = self.endpoint.as_str().trim_end_matches('/').to_owned();
        let mut endpoint = Endpoint::from_shared(origin)
            .map_err(|e| Error::configuration(format!("invalid endpoint: {}", e)).with_source(e))?
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout);

        if self.endpoint.scheme() == "https" {
            endpoint = endpoint
                .tls_config(self.tls_config.to_client_tls_config()?)
                .map_err(|e| Error::configuration(format!("invalid TLS configuration: {}", e)).with_source(e))?;
        }

        let channel = endpoint.connect_lazy();
        let interceptor = BearerToken::new(&self.token)?;

        Ok(GrpcTransport {
            permissions: PermissionsServiceClient::with_interceptor(
                channel.clone(),
                interceptor.clone(),
            ),
            schema: SchemaServiceClient::with_interceptor(channel, interceptor),
        })
    }
}

#[async_trait::async_trait]
impl TransportClient for GrpcTransport {
    #[instrument(skip(self, request), fields(check = %request))]
    async fn check_permission(
        &self,
        request: &CheckRequest,
        consistency: Consistency,
    ) -> Result<Permissionship, Error> {
        let message = proto::CheckPermissionRequest {
            consistency: encode_consistency(consistency),
            resource: Some(encode_object(request.resource())),
            permission: request.permission().to_owned(),
            subject: Some(encode_subject(request.subject())),
            ..Default::default()
        };

        let response = self.permissions.clone().check_permission(message).await?;
        let permissionship = decode_permissionship(response.into_inner().permissionship());
        debug!(?permissionship, "check permission result");
        Ok(permissionship)
    }

    #[instrument(skip(self, requests), fields(items = requests.len()))]
    async fn bulk_check(
        &self,
        requests: &[CheckRequest],
        consistency: Consistency,
    ) -> Result<Vec<BulkCheckPair>, Error> {
        let items = requests
            .iter()
            .map(|request| proto::CheckBulkPermissionsRequestItem {
                resource: Some(encode_object(request.resource())),
                permission: request.permission().to_owned(),
                subject: Some(encode_subject(request.subject())),
                ..Default::default()
            })
            .collect();
        let message = proto::CheckBulkPermissionsRequest {
            consistency: encode_consistency(consistency),
            items,
            ..Default::default()
        };

        let response = self.permissions.clone().check_bulk_permissions(message).await?;
        Ok(response
            .into_inner()
            .pairs
            .into_iter()
            .filter_map(decode_bulk_pair)
            .collect())
    }

    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    async fn write_relationships(
        &self,
        updates: Vec<RelationshipUpdate>,
    ) -> Result<WriteResponse, Error> {
        let updates = updates
            .into_iter()
            .map(|update| proto::RelationshipUpdate {
                operation: encode_operation(update.operation) as i32,
                relationship: Some(encode_relationship(&update.relationship)),
            })
            .collect();
        let message = proto::WriteRelationshipsRequest {
            updates,
            ..Default::default()
        };

        let response = self.permissions.clone().write_relationships(message).await?;
        let written_at = response
            .into_inner()
            .written_at
            .filter(|token| !token.token.is_empty())
            .map(|token| ZedToken::new(token.token));
        Ok(WriteResponse { written_at })
    }

    fn read_relationships(
        &self,
        request: ReadRelationshipsRequest,
    ) -> TransportStream<ReadRelationshipsItem> {
        let mut client = self.permissions.clone();
        let (optional_limit, optional_cursor) = encode_pagination(&request.pagination);
        let message = proto::ReadRelationshipsRequest {
            consistency: encode_consistency(request.consistency),
            relationship_filter: Some(encode_filter(request.filter)),
            optional_limit,
            optional_cursor,
            ..Default::default()
        };

        let call = async move {
            let response = client.read_relationships(message).await?;
            let items = response
                .into_inner()
                .map_err(Error::from)
                .and_then(|item| future::ready(decode_read_item(item)));
            Ok::<_, Error>(items)
        };
        stream::once(call).try_flatten().boxed()
    }

    fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> TransportStream<LookupResourcesItem> {
        let mut client = self.permissions.clone();
        let (optional_limit, optional_cursor) = encode_pagination(&request.pagination);
        let message = proto::LookupResourcesRequest {
            consistency: encode_consistency(request.consistency),
            resource_object_type: request.request.resource_type().to_owned(),
            permission: request.request.permission().to_owned(),
            subject: Some(encode_subject(request.request.subject())),
            optional_limit,
            optional_cursor,
            ..Default::default()
        };

        let call = async move {
            let response = client.lookup_resources(message).await?;
            let items = response.into_inner().map_err(Error::from).map_ok(|item| {
                LookupResourcesItem {
                    resource_id: item.resource_object_id,
                    after_result_cursor: item.after_result_cursor.map(|c| Cursor::new(c.token)),
                }
            });
            Ok::<_, Error>(items)
        };
        stream::once(call).try_flatten().boxed()
    }

    #[instrument(skip(self), fields(resource = %resource))]
    async fn expand_permission_tree(
        &self,
        resource: &ObjectRef,
        permission: &str,
        consistency: Consistency,
    ) -> Result<Option<PermissionTree>, Error> {
        let message = proto::ExpandPermissionTreeRequest {
            consistency: encode_consistency(consistency),
            resource: Some(encode_object(resource)),
            permission: permission.to_owned(),
            ..Default::default()
        };

        let response = self.permissions.clone().expand_permission_tree(message).await?;
        response.into_inner().tree_root.map(decode_tree).transpose()
    }

    #[instrument(skip(self))]
    async fn read_schema(&self) -> Result<String, Error> {
        let response = self
            .schema
            .clone()
            .read_schema(proto::ReadSchemaRequest::default())
            .await?;
        Ok(response.into_inner().schema_text)
    }

    fn transport_type(&self) -> Transport {
        Transport::Grpc
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn encode_consistency(consistency: Consistency) -> Option<proto::Consistency> {
    let requirement = match consistency {
        Consistency::ServerDefault => return None,
        Consistency::FullyConsistent => Requirement::FullyConsistent(true),
        Consistency::MinimizeLatency => Requirement::MinimizeLatency(true),
    };
    Some(proto::Consistency {
        requirement: Some(requirement),
    })
}

fn encode_object(object: &ObjectRef) -> proto::ObjectReference {
    proto::ObjectReference {
        object_type: object.object_type().to_owned(),
        object_id: object.object_id().to_owned(),
    }
}

fn encode_subject(subject: &SubjectRef) -> proto::SubjectReference {
    proto::SubjectReference {
        object: Some(encode_object(subject.object())),
        optional_relation: subject.relation().unwrap_or_default().to_owned(),
    }
}

fn encode_relationship(relationship: &Relationship) -> proto::Relationship {
    proto::Relationship {
        resource: Some(encode_object(relationship.resource())),
        relation: relationship.relation().to_owned(),
        subject: Some(encode_subject(relationship.subject())),
        ..Default::default()
    }
}

fn encode_operation(operation: RelationUpdateType) -> relationship_update::Operation {
    match operation {
        RelationUpdateType::Grant => relationship_update::Operation::Touch,
        RelationUpdateType::Revoke => relationship_update::Operation::Delete,
        RelationUpdateType::Create => relationship_update::Operation::Create,
    }
}

fn encode_filter(filter: RelationshipFilter) -> proto::RelationshipFilter {
    proto::RelationshipFilter {
        resource_type: filter.resource_type,
        optional_resource_id: filter.resource_id.unwrap_or_default(),
        optional_relation: filter.relation.unwrap_or_default(),
        optional_subject_filter: filter.subject.map(|subject| proto::SubjectFilter {
            subject_type: subject.subject_type,
            optional_subject_id: subject.subject_id.unwrap_or_default(),
            optional_relation: subject
                .relation
                .map(|relation| proto::subject_filter::RelationFilter { relation }),
        }),
        ..Default::default()
    }
}

fn encode_pagination(pagination: &Pagination) -> (u32, Option<proto::Cursor>) {
    (
        pagination.limit.unwrap_or(0),
        pagination.cursor.as_ref().map(|cursor| proto::Cursor {
            token: cursor.token().to_owned(),
        }),
    )
}

// ============================================================================
// Decoding
// ============================================================================

fn decode_permissionship(value: check_permission_response::Permissionship) -> Permissionship {
    use check_permission_response::Permissionship as Wire;
    match value {
        Wire::Unspecified => Permissionship::Unspecified,
        Wire::NoPermission => Permissionship::NoPermission,
        Wire::HasPermission => Permissionship::HasPermission,
        Wire::ConditionalPermission => Permissionship::Conditional,
    }
}

fn decode_object(object: Option<proto::ObjectReference>) -> Result<ObjectRef, Error> {
    let object = object.ok_or_else(|| Error::invalid_response("object reference missing"))?;
    Ok(ObjectRef::new(object.object_type, object.object_id))
}

fn decode_subject(subject: Option<proto::SubjectReference>) -> Result<SubjectRef, Error> {
    let subject = subject.ok_or_else(|| Error::invalid_response("subject reference missing"))?;
    Ok(SubjectRef::from(decode_object(subject.object)?).with_relation(subject.optional_relation))
}

fn decode_check_item(item: proto::CheckBulkPermissionsRequestItem) -> Result<CheckRequest, Error> {
    Ok(CheckRequest::from_refs(
        decode_object(item.resource)?,
        item.permission,
        decode_subject(item.subject)?,
    ))
}

/// Pairs a bulk check answer with the request it echoes.
///
/// Returns `None` when the echo is missing or malformed.
fn decode_bulk_pair(pair: proto::CheckBulkPermissionsPair) -> Option<BulkCheckPair> {
    let Some(item) = pair.request else {
        warn!("bulk check pair without request echo, skipping");
        return None;
    };
    let request = match decode_check_item(item) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "bulk check pair with malformed request echo, skipping");
            return None;
        }
    };
    let outcome = match pair.response {
        Some(check_bulk_permissions_pair::Response::Item(item)) => {
            BulkCheckOutcome::Permissionship(decode_permissionship(item.permissionship()))
        }
        Some(check_bulk_permissions_pair::Response::Error(status)) => {
            BulkCheckOutcome::Error(status.message)
        }
        None => BulkCheckOutcome::Permissionship(Permissionship::Unspecified),
    };
    Some(BulkCheckPair { request, outcome })
}

fn decode_read_item(item: proto::ReadRelationshipsResponse) -> Result<ReadRelationshipsItem, Error> {
    let relationship = item
        .relationship
        .ok_or_else(|| Error::invalid_response("read relationships item without relationship"))?;
    Ok(ReadRelationshipsItem {
        relationship: Relationship::new(
            decode_object(relationship.resource)?,
            relationship.relation,
            decode_subject(relationship.subject)?,
        ),
        after_result_cursor: item.after_result_cursor.map(|c| Cursor::new(c.token)),
    })
}

fn decode_tree(node: proto::PermissionRelationshipTree) -> Result<PermissionTree, Error> {
    match node.tree_type {
        Some(TreeType::Leaf(leaf)) => Ok(PermissionTree::Leaf {
            subjects: leaf
                .subjects
                .into_iter()
                .map(|subject| decode_subject(Some(subject)))
                .collect::<Result<_, _>>()?,
        }),
        Some(TreeType::Intermediate(set)) => Ok(PermissionTree::Intermediate {
            children: set
                .children
                .into_iter()
                .map(decode_tree)
                .collect::<Result<_, _>>()?,
        }),
        None => Err(Error::invalid_response("expansion tree node without tree type")),
    }
}
