//! Integration tests for `SqliteStore` against an in-memory database.

use uuid::Uuid;
use visor_core::{
  association::{AssociationOrigin, ConfidenceTier, NewAssociation},
  fact::{CompetitorMention, NewAnswerFact},
  keyword::NewSerpKeyword,
  prompt::Prompt,
  store::VisibilityStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn prompt(project_id: Uuid, name: &str, template: &str) -> Prompt {
  Prompt {
    prompt_id: Uuid::new_v4(),
    project_id,
    name: name.to_string(),
    template: template.to_string(),
    tags: vec!["seo".to_string()],
    active: true,
  }
}

fn keyword(text: &str, position: u32) -> NewSerpKeyword {
  NewSerpKeyword {
    keyword:    text.to_string(),
    normalized: text.to_lowercase(),
    volume:     Some(1000),
    position,
    url:        Some(format!("https://example.fr/{position}")),
  }
}

fn fact(prompt_id: Uuid, project_id: Uuid, mentioned: bool) -> NewAnswerFact {
  NewAnswerFact {
    prompt_id,
    project_id,
    model: "gpt-test".to_string(),
    response: "1. Amazon\n2. MaMarque".to_string(),
    brand_mentioned: mentioned,
    brand_linked: false,
    brand_position: Some(2),
    competitors: vec![CompetitorMention {
      name:      "Amazon".to_string(),
      mentioned: true,
      position:  Some(1),
    }],
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_prompt() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();

  let fetched = s.get_prompt(p.prompt_id).await.unwrap().unwrap();
  assert_eq!(fetched.prompt_id, p.prompt_id);
  assert_eq!(fetched.name, "Casques");
  assert_eq!(fetched.tags, vec!["seo".to_string()]);
  assert!(fetched.active);
}

#[tokio::test]
async fn get_prompt_missing_returns_none() {
  let s = store().await;
  assert!(s.get_prompt(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_prompt_replaces_by_id() {
  let s = store().await;
  let project = Uuid::new_v4();

  let mut p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  p.template = "Quel casque gaming choisir en 2024 ?".to_string();
  p.active = false;
  s.upsert_prompt(p.clone()).await.unwrap();

  let fetched = s.get_prompt(p.prompt_id).await.unwrap().unwrap();
  assert_eq!(fetched.template, "Quel casque gaming choisir en 2024 ?");
  assert!(!fetched.active);

  let all = s.list_prompts(project).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn list_prompts_scoped_to_project() {
  let s = store().await;
  let project_a = Uuid::new_v4();
  let project_b = Uuid::new_v4();

  s.upsert_prompt(prompt(project_a, "A", "t")).await.unwrap();
  s.upsert_prompt(prompt(project_a, "B", "t")).await.unwrap();
  s.upsert_prompt(prompt(project_b, "C", "t")).await.unwrap();

  assert_eq!(s.list_prompts(project_a).await.unwrap().len(), 2);
  assert_eq!(s.list_prompts(project_b).await.unwrap().len(), 1);
}

// ─── Keyword imports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn import_assigns_ids_and_lists_by_position() {
  let s = store().await;
  let project = Uuid::new_v4();

  let imported = s
    .import_keywords(
      project,
      vec![keyword("casque gaming", 5), keyword("casque bluetooth", 2)],
    )
    .await
    .unwrap();
  assert_eq!(imported.len(), 2);

  let listed = s.list_keywords(project).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].position, 2);
  assert_eq!(listed[1].position, 5);
}

#[tokio::test]
async fn reimport_supersedes_previous_generation() {
  let s = store().await;
  let project = Uuid::new_v4();

  s.import_keywords(project, vec![keyword("casque gaming", 3)])
    .await
    .unwrap();
  s.import_keywords(
    project,
    vec![keyword("casque gaming", 1), keyword("souris gaming", 7)],
  )
  .await
  .unwrap();

  // Only the second generation is visible.
  let listed = s.list_keywords(project).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].keyword, "casque gaming");
  assert_eq!(listed[0].position, 1);
}

#[tokio::test]
async fn import_does_not_touch_other_projects() {
  let s = store().await;
  let project_a = Uuid::new_v4();
  let project_b = Uuid::new_v4();

  s.import_keywords(project_a, vec![keyword("casque gaming", 3)])
    .await
    .unwrap();
  s.import_keywords(project_b, vec![keyword("souris gaming", 4)])
    .await
    .unwrap();

  assert_eq!(s.list_keywords(project_a).await.unwrap().len(), 1);
  assert_eq!(s.list_keywords(project_b).await.unwrap().len(), 1);
}

// ─── Associations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn association_upsert_round_trip() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  let keywords = s
    .import_keywords(project, vec![keyword("casque gaming", 2)])
    .await
    .unwrap();

  let a = s
    .upsert_association(NewAssociation {
      prompt_id:  p.prompt_id,
      keyword_id: keywords[0].keyword_id,
      score:      0.92,
      tier:       ConfidenceTier::High,
      origin:     AssociationOrigin::Auto,
    })
    .await
    .unwrap();
  assert_eq!(a.prompt_id, p.prompt_id);
  assert_eq!(a.score, 0.92);
  assert_eq!(a.tier, ConfidenceTier::High);
  assert_eq!(a.origin, AssociationOrigin::Auto);

  let listed = s.list_associations(project).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].keyword_id, keywords[0].keyword_id);
}

#[tokio::test]
async fn association_upsert_is_keyed_by_prompt() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  let keywords = s
    .import_keywords(
      project,
      vec![keyword("casque gaming", 2), keyword("casque bluetooth", 6)],
    )
    .await
    .unwrap();

  let first = s
    .upsert_association(NewAssociation {
      prompt_id:  p.prompt_id,
      keyword_id: keywords[0].keyword_id,
      score:      0.92,
      tier:       ConfidenceTier::High,
      origin:     AssociationOrigin::Auto,
    })
    .await
    .unwrap();

  // Re-associate the same prompt to a different keyword: one row, updated
  // in place, created_at preserved.
  let second = s
    .upsert_association(NewAssociation {
      prompt_id:  p.prompt_id,
      keyword_id: keywords[1].keyword_id,
      score:      0.55,
      tier:       ConfidenceTier::Medium,
      origin:     AssociationOrigin::Manual,
    })
    .await
    .unwrap();

  assert_eq!(second.keyword_id, keywords[1].keyword_id);
  assert_eq!(second.created_at, first.created_at);
  assert_eq!(s.list_associations(project).await.unwrap().len(), 1);
}

#[tokio::test]
async fn association_requires_existing_sides() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  let keywords = s
    .import_keywords(project, vec![keyword("casque gaming", 2)])
    .await
    .unwrap();

  let missing_prompt = s
    .upsert_association(NewAssociation {
      prompt_id:  Uuid::new_v4(),
      keyword_id: keywords[0].keyword_id,
      score:      0.9,
      tier:       ConfidenceTier::High,
      origin:     AssociationOrigin::Auto,
    })
    .await;
  assert!(matches!(missing_prompt, Err(Error::PromptNotFound(_))));

  let missing_keyword = s
    .upsert_association(NewAssociation {
      prompt_id:  p.prompt_id,
      keyword_id: Uuid::new_v4(),
      score:      0.9,
      tier:       ConfidenceTier::High,
      origin:     AssociationOrigin::Auto,
    })
    .await;
  assert!(matches!(missing_keyword, Err(Error::KeywordNotFound(_))));
}

#[tokio::test]
async fn delete_association_reports_whether_one_existed() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  let keywords = s
    .import_keywords(project, vec![keyword("casque gaming", 2)])
    .await
    .unwrap();
  s.upsert_association(NewAssociation {
    prompt_id:  p.prompt_id,
    keyword_id: keywords[0].keyword_id,
    score:      0.9,
    tier:       ConfidenceTier::High,
    origin:     AssociationOrigin::Auto,
  })
  .await
  .unwrap();

  assert!(s.delete_association(p.prompt_id).await.unwrap());
  assert!(!s.delete_association(p.prompt_id).await.unwrap());
  assert!(s.list_associations(project).await.unwrap().is_empty());
}

// ─── Answer facts ────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_fact_and_list() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();

  let recorded = s
    .record_fact(fact(p.prompt_id, project, true))
    .await
    .unwrap();
  assert_eq!(recorded.prompt_id, p.prompt_id);

  let facts = s.list_facts(project, None).await.unwrap();
  assert_eq!(facts.len(), 1);
  let f = &facts[0];
  assert_eq!(f.fact_id, recorded.fact_id);
  assert!(f.brand_mentioned);
  assert_eq!(f.brand_position, Some(2));
  assert_eq!(f.competitors.len(), 1);
  assert_eq!(f.competitors[0].name, "Amazon");
  assert_eq!(f.competitors[0].position, Some(1));
}

#[tokio::test]
async fn facts_accumulate_append_only() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();

  for mentioned in [true, false, true] {
    s.record_fact(fact(p.prompt_id, project, mentioned))
      .await
      .unwrap();
  }

  let facts = s.list_facts(project, None).await.unwrap();
  assert_eq!(facts.len(), 3);
  // Oldest first.
  assert!(facts.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
}

#[tokio::test]
async fn list_facts_honors_since_bound() {
  let s = store().await;
  let project = Uuid::new_v4();

  let p = s
    .upsert_prompt(prompt(project, "Casques", "Quel casque gaming ?"))
    .await
    .unwrap();
  s.record_fact(fact(p.prompt_id, project, true)).await.unwrap();
  let second = s
    .record_fact(fact(p.prompt_id, project, false))
    .await
    .unwrap();

  let recent = s
    .list_facts(project, Some(second.recorded_at))
    .await
    .unwrap();
  assert_eq!(recent.len(), 1);
  assert_eq!(recent[0].fact_id, second.fact_id);

  let none = s
    .list_facts(Uuid::new_v4(), None)
    .await
    .unwrap();
  assert!(none.is_empty());
}
