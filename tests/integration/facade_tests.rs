//! Facade operations against a live SpiceDB.

use std::collections::BTreeSet;

use anyhow::Result;
use spicedb_facade::prelude::*;

use crate::common::{client, unique_id};

#[tokio::test]
async fn test_read_schema() -> Result<()> {
    let client = client().await?;
    let schema = client.read_schema().await?;
    assert!(schema.contains("definition document"));
    Ok(())
}

#[tokio::test]
async fn test_grant_relations_revoke_round_trip() -> Result<()> {
    let client = client().await?;
    let doc = ObjectRef::new("document", unique_id("doc"));
    let user = SubjectRef::new("user", unique_id("user"));

    client.grant(&doc, "owner", &user).await?;
    let relations = client.relations(&doc, &user, Pagination::default()).await?;
    assert_eq!(relations, vec!["owner"]);
    assert!(client.check_relation(&doc, "owner", &user).await?);

    client.revoke(&doc, "owner", &user).await?;
    let relations = client.relations(&doc, &user, Pagination::default()).await?;
    assert!(relations.is_empty());
    assert!(!client.check_relation(&doc, "owner", &user).await?);
    Ok(())
}

#[tokio::test]
async fn test_check_follows_permissions() -> Result<()> {
    let client = client().await?;
    let doc_id = unique_id("doc");
    let owner_id = unique_id("user");
    let stranger_id = unique_id("user");

    let owner_view = CheckRequest::new("user", &owner_id, "document", &doc_id, "view");
    let stranger_view = CheckRequest::new("user", &stranger_id, "document", &doc_id, "view");
    assert_eq!(client.check(&owner_view, Consistency::FullyConsistent).await?, Access::Forbid);

    client
        .grant(&ObjectRef::new("document", &doc_id), "owner", &SubjectRef::new("user", &owner_id))
        .await?;

    // view = viewer + edit, edit = owner
    assert_eq!(client.check(&owner_view, Consistency::FullyConsistent).await?, Access::Allow);
    assert!(!client.is_allowed(&stranger_view, Consistency::FullyConsistent).await?);

    let results = client
        .check_many(&[owner_view.clone(), stranger_view.clone()], Consistency::FullyConsistent)
        .await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[&owner_view], Access::Allow);
    assert_eq!(results[&stranger_view], Access::Forbid);

    assert!(client.check_many(&[], Consistency::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_conflicts_on_existing_tuple() -> Result<()> {
    let client = client().await?;
    let create = RelationUpdateRequest::create("user", unique_id("user"), "document", unique_id("doc"), "owner");

    client.update(std::slice::from_ref(&create)).await?;
    let err = client.update(std::slice::from_ref(&create)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    Ok(())
}

#[tokio::test]
async fn test_unknown_relation_is_rejected() -> Result<()> {
    let client = client().await?;
    let doc = ObjectRef::new("document", unique_id("doc"));
    let user = SubjectRef::new("user", unique_id("user"));

    let err = client.grant(&doc, "no_such_relation", &user).await.unwrap_err();
    assert!(!err.is_retriable(), "unexpected error kind {:?}", err.kind());
    Ok(())
}

#[tokio::test]
async fn test_resources_and_resources_many() -> Result<()> {
    let client = client().await?;
    let user_id = unique_id("user");
    let user = SubjectRef::new("user", &user_id);
    let owned = [unique_id("doc"), unique_id("doc")];
    let viewed = unique_id("doc");

    client
        .grant_many(&[
            RelationUpdateRequest::grant("user", &user_id, "document", &owned[0], "owner"),
            RelationUpdateRequest::grant("user", &user_id, "document", &owned[1], "owner"),
            RelationUpdateRequest::grant("user", &user_id, "document", &viewed, "viewer"),
        ])
        .await?;

    let editable = ResourcesRequest::for_subject("document", "edit", user.clone());
    let viewable = ResourcesRequest::for_subject("document", "view", user.clone());

    let ids: BTreeSet<String> = client.resources(&editable, Pagination::default()).await?.into_iter().collect();
    assert_eq!(ids, BTreeSet::from(owned.clone()));

    let results = client
        .resources_many(&[editable.clone(), viewable.clone()], Pagination::default())
        .await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[&editable].len(), 2);
    assert_eq!(results[&viewable].len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_subjects_filters_by_type() -> Result<()> {
    let client = client().await?;
    let doc = ObjectRef::new("document", unique_id("doc"));
    let viewer_id = unique_id("user");
    let group_id = unique_id("group");

    client.grant(&doc, "viewer", &SubjectRef::new("user", &viewer_id)).await?;
    client
        .grant(&doc, "viewer", &SubjectRef::new("group", &group_id).with_relation("member"))
        .await?;

    let users = client.subjects(&doc, "view", "user", Consistency::FullyConsistent).await?;
    assert!(users.contains(&viewer_id));
    assert!(!users.contains(&group_id));
    Ok(())
}

#[tokio::test]
async fn test_grouped_enumerations() -> Result<()> {
    let client = client().await?;
    let battle_id = unique_id("battle");
    let battle = ObjectRef::new("game_portal/battle", &battle_id);
    let attacker_id = unique_id("user");
    let attacker = SubjectRef::new("user", &attacker_id);
    let defender = SubjectRef::new("user", unique_id("user"));

    client.grant(&battle, "solo_attacker", &attacker).await?;
    client.grant(&battle, "solo_defender", &attacker).await?;
    client.grant(&battle, "solo_defender", &defender).await?;

    let resources = client
        .resources_with_relations("game_portal/battle", &attacker, None, Pagination::default())
        .await?;
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].resource_id, battle_id);
    assert_eq!(
        resources[0].relations,
        BTreeSet::from(["solo_attacker".to_owned(), "solo_defender".to_owned()])
    );

    let subjects = client
        .subjects_with_relations(
            "game_portal/battle",
            Some(battle_id.as_str().into()),
            Some("user"),
            Pagination::default(),
        )
        .await?;
    assert_eq!(subjects.len(), 2);
    let attacker_entry = subjects
        .iter()
        .find(|s| s.subject_id == attacker_id)
        .ok_or_else(|| anyhow::anyhow!("attacker missing from {:?}", subjects))?;
    assert_eq!(attacker_entry.relations.len(), 2);
    Ok(())
}
