mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::*;
use cultural_lens::exemplars::ExemplarCorpus;
use cultural_lens::{
    AlignmentScore, AlignmentScorer, CulturalDimension, ProfileInferencer, extract,
};

fn dims(list: &[CulturalDimension]) -> BTreeSet<CulturalDimension> {
    list.iter().copied().collect()
}

async fn counting_scorer() -> (Arc<CountingEmbedder>, AlignmentScorer) {
    let embedder = Arc::new(CountingEmbedder::new());
    let inferencer = ProfileInferencer::new(embedder.clone(), &ExemplarCorpus::builtin().unwrap())
        .await
        .unwrap();
    (embedder, AlignmentScorer::new(inferencer, test_registry()))
}

#[tokio::test]
async fn collectivist_response_aligns_with_collectivist_reference() {
    let scorer = AlignmentScorer::new(keyword_inferencer().await, test_registry());
    let response = extract(COLLECTIVIST_RESPONSE);
    assert!(response.extraction_succeeded());

    let relevant = dims(&[
        CulturalDimension::Individualism,
        CulturalDimension::PowerDistance,
    ]);
    let collectivist = scorer
        .score(&response, "Collectivia", &relevant)
        .await
        .unwrap()
        .value()
        .unwrap();
    let individualist = scorer
        .score(&response, "Individualia", &relevant)
        .await
        .unwrap()
        .value()
        .unwrap();

    assert!(collectivist > 5.0, "got {collectivist}");
    assert!(collectivist > individualist);
}

#[tokio::test]
async fn inferred_profile_leans_toward_collectivism() {
    let inferencer = keyword_inferencer().await;
    let profile = inferencer.infer(&extract(COLLECTIVIST_RESPONSE)).await.unwrap();
    assert!(profile.get(CulturalDimension::Individualism) < 0.0);
    assert!(profile.get(CulturalDimension::PowerDistance) > 0.0);
    // No exemplars for the remaining dimensions.
    assert_eq!(profile.get(CulturalDimension::Indulgence), 0.0);
}

#[tokio::test]
async fn baseline_is_not_applicable_without_embedding() {
    let (embedder, scorer) = counting_scorer().await;
    let response = extract(COLLECTIVIST_RESPONSE);
    for culture in ["baseline", "Baseline"] {
        let score = scorer
            .score(&response, culture, &dims(&CulturalDimension::ALL))
            .await
            .unwrap();
        assert_eq!(score, AlignmentScore::NotApplicable);
    }
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn failed_extraction_scores_zero_for_every_culture() {
    let (embedder, scorer) = counting_scorer().await;
    let response = extract("I would rather not pick anything.");
    assert!(!response.extraction_succeeded());
    for culture in ["Collectivia", "baseline", "Blank", "Atlantis"] {
        let score = scorer
            .score(&response, culture, &dims(&CulturalDimension::ALL))
            .await
            .unwrap();
        assert_eq!(score, AlignmentScore::Score(0.0), "{culture}");
    }
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn degenerate_references() {
    let (embedder, scorer) = counting_scorer().await;
    let response = extract(COLLECTIVIST_RESPONSE);
    let individualism = dims(&[CulturalDimension::Individualism]);

    let unknown = scorer.score(&response, "Atlantis", &individualism).await.unwrap();
    assert_eq!(unknown, AlignmentScore::Score(0.0));

    let blank = scorer.score(&response, "Blank", &individualism).await.unwrap();
    assert_eq!(blank, AlignmentScore::NotApplicable);

    let no_overlap = scorer.score(&response, "Harmonia", &individualism).await.unwrap();
    assert_eq!(no_overlap, AlignmentScore::Score(5.0));

    assert_eq!(embedder.calls(), 0);

    let scored = scorer.score(&response, "Collectivia", &individualism).await.unwrap();
    assert!(scored.is_applicable());
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn empty_blob_skips_embedder() {
    let (embedder, scorer) = counting_scorer().await;
    let profile = scorer.inferencer().infer(&extract("")).await.unwrap();
    assert!(profile.is_neutral());
    let profile = scorer.inferencer().infer(&extract(" \n\t ")).await.unwrap();
    assert!(profile.is_neutral());
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn fake_embedder_profiles_stay_on_scale() {
    let (_, scorer) = counting_scorer().await;
    for raw in [
        COLLECTIVIST_RESPONSE,
        "DECISION: compromise\nTOP VALUES: balance, flexibility\nEXPLANATION: both matter",
        "DECISION: something else\nTOP_VALUES:\n- Tradition\n",
    ] {
        let profile = scorer.inferencer().infer(&extract(raw)).await.unwrap();
        for (dim, value) in profile.iter() {
            assert!((-2.0..=2.0).contains(&value), "{dim}: {value}");
        }
    }
}
