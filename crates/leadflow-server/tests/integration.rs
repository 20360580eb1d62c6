use std::sync::Arc;

use axum::http::StatusCode;
use completion_client::{ClientConfig, CompletionClient, CompletionError, ScriptedBackend};
use http_body_util::BodyExt;
use leadflow_core::campaign::Campaign;
use leadflow_core::generation::GenerationSettings;
use leadflow_core::lead::Lead;
use leadflow_core::stage::FunnelStage;
use leadflow_core::store::{MemoryStore, Store};
use leadflow_core::workspace::create_workspace;
use leadflow_server::{build_router, AppState};
use tower::ServiceExt;
use uuid::Uuid;

const THREE: &str = r#"{"messages":["Oi Ana!","Tudo bem, Ana?","Olá, Ana."]}"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    store: Arc<MemoryStore>,
    backend: Arc<ScriptedBackend>,
    workspace_id: Uuid,
    stages: Vec<FunnelStage>,
}

impl Fixture {
    async fn new(backend: ScriptedBackend) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (workspace, stages) = create_workspace(store.as_ref(), "Acme", Uuid::new_v4())
            .await
            .unwrap();
        Self {
            store,
            backend: Arc::new(backend),
            workspace_id: workspace.id,
            stages,
        }
    }

    fn stage(&self, name: &str) -> &FunnelStage {
        self.stages.iter().find(|s| s.name == name).unwrap()
    }

    fn app(&self) -> axum::Router {
        let state = AppState::new(
            self.store.clone(),
            self.backend.clone(),
            GenerationSettings::default(),
        )
        .without_auto_trigger();
        build_router(state)
    }

    async fn lead(&self, stage: &str, name: &str) -> Lead {
        let lead = Lead::new(self.workspace_id, self.stage(stage).id, name);
        self.store.insert_lead(&lead).await.unwrap();
        lead
    }

    async fn campaign(&self, name: &str, trigger: Option<&str>) -> Campaign {
        let mut campaign = Campaign::new(self.workspace_id, name, "Produto X", "Seja breve");
        if let Some(stage) = trigger {
            campaign = campaign.triggered_by(self.stage(stage).id);
        }
        self.store.insert_campaign(&campaign).await.unwrap();
        campaign
    }

    fn ws(&self, rest: &str) -> String {
        format!("/api/workspaces/{}{rest}", self.workspace_id)
    }
}

/// Send a request via `oneshot` and return (status, parsed JSON body).
async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    user: Option<Uuid>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body), None).await
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, json) = get(fx.app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// ---------------------------------------------------------------------------
// generate-message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_message_returns_three_variants_and_saves_row() {
    let fx = Fixture::new(ScriptedBackend::new().reply(THREE)).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;

    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(
        json["messages"],
        serde_json::json!(["Oi Ana!", "Tudo bem, Ana?", "Olá, Ana."])
    );
    assert!(json["generated_at"].as_str().unwrap().ends_with('Z'));

    let rows = fx.store.list_generated_messages(lead.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].campaign_id, campaign.id);

    let activity = fx.store.list_activity(lead.id).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action_type.as_str(), "message_generated");
    assert_eq!(activity[0].details["trigger"], "manual");
}

#[tokio::test]
async fn generate_message_prompt_carries_lead_and_campaign() {
    let fx = Fixture::new(ScriptedBackend::new().reply(THREE)).await;
    let lead = fx.lead("Contato", "Ana Lima").await;
    let campaign = fx.campaign("Boas-vindas", None).await;

    post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;

    let requests = fx.backend.requests();
    assert_eq!(requests.len(), 1);
    let prompt = requests[0].user_content().unwrap();
    assert!(prompt.contains("Ana Lima"));
    assert!(prompt.contains("Contato"));
    assert!(prompt.contains("Seja breve"));
}

#[tokio::test]
async fn generate_message_twice_adds_two_rows() {
    let fx = Fixture::new(ScriptedBackend::always(THREE)).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;
    let body = serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id });

    for _ in 0..2 {
        let (status, _) = post_json(fx.app(), "/functions/v1/generate-message", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(fx.store.list_generated_messages(lead.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn generate_message_missing_ids_is_400() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    for body in [
        serde_json::json!({}),
        serde_json::json!({ "leadId": Uuid::new_v4() }),
        serde_json::json!({ "leadId": "  ", "campaignId": Uuid::new_v4() }),
    ] {
        let (status, json) = post_json(fx.app(), "/functions/v1/generate-message", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "leadId e campaignId são obrigatórios");
    }
    assert_eq!(fx.backend.call_count(), 0);
}

#[tokio::test]
async fn generate_message_unknown_lead_is_500() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let campaign = fx.campaign("Boas-vindas", None).await;
    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": Uuid::new_v4(), "campaignId": campaign.id }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Lead não encontrado");
}

#[tokio::test]
async fn generate_message_unknown_campaign_is_500() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let lead = fx.lead("Novo", "Ana").await;
    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": "not-a-uuid" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Campanha não encontrada");
}

#[tokio::test]
async fn generate_message_survives_failed_save() {
    let fx = Fixture::new(ScriptedBackend::new().reply(THREE)).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;
    fx.store.fail_message_inserts(true);

    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["messages"].as_array().unwrap().len(), 3);
    assert!(fx.store.list_generated_messages(lead.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn generate_message_placeholder_on_empty_output() {
    let fx = Fixture::new(ScriptedBackend::new().reply("   \n  ")).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;

    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn generate_message_provider_error_text_is_returned() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let (workspace, stages) = create_workspace(store.as_ref(), "Acme", Uuid::new_v4())
        .await
        .unwrap();
    let lead = Lead::new(workspace.id, stages[0].id, "Ana");
    store.insert_lead(&lead).await.unwrap();
    let campaign = Campaign::new(workspace.id, "Boas-vindas", "", "Seja breve");
    store.insert_campaign(&campaign).await.unwrap();

    let client =
        CompletionClient::new(ClientConfig::with_api_key("sk-test").base_url(server.url())).unwrap();
    let app = build_router(AppState::new(
        store.clone(),
        Arc::new(client),
        GenerationSettings::default(),
    ));

    let (status, json) = post_json(
        app,
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Erro na API OpenAI: Rate limit reached");
    assert!(store.list_generated_messages(lead.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_function_body_is_400() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/functions/v1/generate-message")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{leadId"))
        .unwrap();
    let response = fx.app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// auto-generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auto_generate_without_campaigns_reports_message() {
    let fx = Fixture::new(ScriptedBackend::always(THREE)).await;
    let lead = fx.lead("Contato", "Ana").await;
    fx.campaign("Manual", None).await;

    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/auto-generate",
        serde_json::json!({ "leadId": lead.id, "newStageId": fx.stage("Contato").id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({
            "success": true,
            "message": "Nenhuma campanha com gatilho nesta etapa",
        })
    );
    assert_eq!(fx.backend.call_count(), 0);
    assert!(fx.store.list_generated_messages(lead.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn auto_generate_isolates_campaign_failures() {
    let backend = ScriptedBackend::new()
        .fail(CompletionError::Api {
            status: 500,
            message: "upstream".into(),
        })
        .reply(THREE);
    let fx = Fixture::new(backend).await;
    let lead = fx.lead("Contato", "Ana").await;
    let first = fx.campaign("Primeira", Some("Contato")).await;
    let second = fx.campaign("Segunda", Some("Contato")).await;

    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/auto-generate",
        serde_json::json!({ "leadId": lead.id, "newStageId": fx.stage("Contato").id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["campaignsProcessed"], 2);
    assert_eq!(
        json["results"],
        serde_json::json!([
            { "campaignId": first.id, "success": false },
            { "campaignId": second.id, "success": true },
        ])
    );
    let rows = fx.store.list_generated_messages(lead.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].campaign_id, second.id);
}

#[tokio::test]
async fn auto_generate_skips_inactive_and_other_stages() {
    let fx = Fixture::new(ScriptedBackend::always(THREE)).await;
    let lead = fx.lead("Contato", "Ana").await;
    let inactive = Campaign::new(fx.workspace_id, "Pausada", "", "p")
        .triggered_by(fx.stage("Contato").id)
        .inactive();
    fx.store.insert_campaign(&inactive).await.unwrap();
    fx.campaign("Proposta", Some("Proposta")).await;
    let live = fx.campaign("Ativa", Some("Contato")).await;

    let (_, json) = post_json(
        fx.app(),
        "/functions/v1/auto-generate",
        serde_json::json!({ "leadId": lead.id, "newStageId": fx.stage("Contato").id }),
    )
    .await;
    assert_eq!(json["campaignsProcessed"], 1);
    assert_eq!(json["results"][0]["campaignId"], live.id.to_string());
}

#[tokio::test]
async fn auto_generate_missing_stage_is_400() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/auto-generate",
        serde_json::json!({ "leadId": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "leadId e newStageId são obrigatórios");
}

#[tokio::test]
async fn auto_generate_unknown_lead_is_500() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, json) = post_json(
        fx.app(),
        "/functions/v1/auto-generate",
        serde_json::json!({ "leadId": Uuid::new_v4(), "newStageId": fx.stage("Contato").id }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Lead não encontrado");
}

// ---------------------------------------------------------------------------
// Leads and stage moves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_is_rejected_until_required_fields_are_filled() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let contato = fx.stage("Contato").id;
    fx.store
        .set_required_fields(contato, &["phone".to_string()])
        .await
        .unwrap();
    let lead = fx.lead("Novo", "Ana").await;
    let move_uri = fx.ws(&format!("/leads/{}/move", lead.id));

    let (status, json) = post_json(
        fx.app(),
        &move_uri,
        serde_json::json!({ "stage_id": contato }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["missing_fields"], serde_json::json!(["Telefone"]));
    let unchanged = fx.store.get_lead(lead.id).await.unwrap().unwrap();
    assert_eq!(unchanged.stage_id, fx.stage("Novo").id);

    let (status, _) = send(
        fx.app(),
        "PATCH",
        &fx.ws(&format!("/leads/{}", lead.id)),
        Some(serde_json::json!({ "phone": "+55 11 99999-0000" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user = Uuid::new_v4();
    let (status, json) = send(
        fx.app(),
        "POST",
        &move_uri,
        Some(serde_json::json!({ "stage_id": contato })),
        Some(user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["moved"], true);
    assert_eq!(json["lead"]["stage_id"], contato.to_string());

    let activity = fx.store.list_activity(lead.id).await.unwrap();
    let moved = activity.last().unwrap();
    assert_eq!(moved.action_type.as_str(), "stage_changed");
    assert_eq!(moved.user_id, Some(user));
    assert_eq!(moved.details["from_stage"], "Novo");
    assert_eq!(moved.details["to_stage"], "Contato");
}

#[tokio::test]
async fn create_lead_validates_form_and_stage() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let uri = fx.ws("/leads");

    let (status, json) = post_json(
        fx.app(),
        &uri,
        serde_json::json!({ "name": "  ", "stage_id": fx.stage("Novo").id }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Nome é obrigatório");

    let (other, other_stages) = create_workspace(fx.store.as_ref(), "Outra", Uuid::new_v4())
        .await
        .unwrap();
    assert_ne!(other.id, fx.workspace_id);
    let (status, _) = post_json(
        fx.app(),
        &uri,
        serde_json::json!({ "name": "Ana", "stage_id": other_stages[0].id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post_json(
        fx.app(),
        &uri,
        serde_json::json!({
            "name": "Ana Lima",
            "email": "ana@acme.com",
            "stage_id": fx.stage("Novo").id,
            "custom_data": { "Setor": "Varejo" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "Ana Lima");
    assert_eq!(json["custom_data"]["Setor"], "Varejo");
}

#[tokio::test]
async fn board_lists_stages_in_order_with_leads() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    fx.lead("Novo", "Ana").await;
    fx.lead("Proposta", "Rui").await;

    let (status, json) = get(fx.app(), &fx.ws("/board")).await;
    assert_eq!(status, StatusCode::OK);
    let columns = json.as_array().unwrap();
    let names: Vec<_> = columns.iter().map(|c| c["stage"]["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Novo", "Contato", "Proposta", "Negociação", "Fechado"]);
    assert_eq!(columns[0]["leads"][0]["name"], "Ana");
    assert_eq!(columns[2]["leads"][0]["name"], "Rui");
}

#[tokio::test]
async fn unknown_workspace_and_lead_are_404() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, _) = get(fx.app(), &format!("/api/workspaces/{}/board", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, json) = get(fx.app(), &fx.ws(&format!("/leads/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Lead não encontrado");
}

// ---------------------------------------------------------------------------
// Stages, campaigns, messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn required_fields_reject_unknown_names() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let uri = fx.ws(&format!("/stages/{}/required-fields", fx.stage("Proposta").id));

    let (status, _) = send(
        fx.app(),
        "PUT",
        &uri,
        Some(serde_json::json!({ "required_fields": ["email", "Orçamento"] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send(
        fx.app(),
        "PUT",
        &uri,
        Some(serde_json::json!({ "required_fields": ["email", " company ", "email"] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["required_fields"], serde_json::json!(["email", "company"]));
}

#[tokio::test]
async fn campaign_create_and_clear_trigger() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, json) = post_json(
        fx.app(),
        &fx.ws("/campaigns"),
        serde_json::json!({
            "name": "Boas-vindas",
            "context": "Produto X",
            "prompt": "Seja breve",
            "trigger_stage_id": fx.stage("Contato").id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["is_active"], true);
    let id = json["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        fx.app(),
        "PUT",
        &fx.ws(&format!("/campaigns/{id}")),
        Some(serde_json::json!({ "trigger_stage_id": null })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["trigger_stage_id"].is_null());
    assert_eq!(json["name"], "Boas-vindas");

    let (status, _) = post_json(
        fx.app(),
        &fx.ws("/campaigns"),
        serde_json::json!({ "name": "Sem prompt", "prompt": " " }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn mark_sent_checks_variant() {
    let fx = Fixture::new(ScriptedBackend::new().reply(THREE)).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;
    post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;
    let (_, listed) = get(fx.app(), &fx.ws(&format!("/leads/{}/messages", lead.id))).await;
    let message_id = listed[0]["id"].as_str().unwrap().to_string();
    let uri = fx.ws(&format!("/leads/{}/messages/{message_id}/sent", lead.id));

    let (status, json) = post_json(fx.app(), &uri, serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "variante é obrigatória");

    let (status, _) = post_json(fx.app(), &uri, serde_json::json!({ "variant": 3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post_json(fx.app(), &uri, serde_json::json!({ "variant": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["sent_at"].is_string());

    let (_, activity) = get(fx.app(), &fx.ws(&format!("/leads/{}/activity", lead.id))).await;
    let last = activity.as_array().unwrap().last().unwrap();
    assert_eq!(last["action_type"], "message_sent");
    assert_eq!(last["details"]["variant"], 1);
}

#[tokio::test]
async fn mark_sent_from_another_workspace_is_404() {
    let fx = Fixture::new(ScriptedBackend::new().reply(THREE)).await;
    let lead = fx.lead("Novo", "Ana").await;
    let campaign = fx.campaign("Boas-vindas", None).await;
    post_json(
        fx.app(),
        "/functions/v1/generate-message",
        serde_json::json!({ "leadId": lead.id, "campaignId": campaign.id }),
    )
    .await;
    let message = &fx.store.list_generated_messages(lead.id).await.unwrap()[0];

    let (other, _) = create_workspace(fx.store.as_ref(), "Outra", Uuid::new_v4())
        .await
        .unwrap();
    let foreign_uri = format!(
        "/api/workspaces/{}/leads/{}/messages/{}/sent",
        other.id, lead.id, message.id
    );
    let (status, json) =
        post_json(fx.app(), &foreign_uri, serde_json::json!({ "variant": 0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Lead não encontrado");

    let other_lead = fx.lead("Novo", "Rui").await;
    let wrong_lead_uri = fx.ws(&format!("/leads/{}/messages/{}/sent", other_lead.id, message.id));
    let (status, _) =
        post_json(fx.app(), &wrong_lead_uri, serde_json::json!({ "variant": 0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stored = fx.store.get_generated_message(message.id).await.unwrap().unwrap();
    assert!(stored.sent_at.is_none());
}

// ---------------------------------------------------------------------------
// Malformed REST input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_with_non_uuid_stage_is_400_with_error_body() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let lead = fx.lead("Novo", "Ana").await;
    let (status, json) = post_json(
        fx.app(),
        &fx.ws(&format!("/leads/{}/move", lead.id)),
        serde_json::json!({ "stage_id": "contato" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("corpo da requisição inválido"));
    assert!(error.contains("stage_id"));
    let unchanged = fx.store.get_lead(lead.id).await.unwrap().unwrap();
    assert_eq!(unchanged.stage_id, fx.stage("Novo").id);
}

#[tokio::test]
async fn non_uuid_workspace_in_path_is_400_with_error_body() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let (status, json) = get(fx.app(), "/api/workspaces/acme/board").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("caminho inválido"));

    let lead = fx.lead("Novo", "Ana").await;
    let (status, json) = get(fx.app(), &format!("/api/workspaces/acme/leads/{}", lead.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn mistyped_or_malformed_lead_body_is_400_with_error_body() {
    let fx = Fixture::new(ScriptedBackend::new()).await;
    let uri = fx.ws("/leads");

    let (status, json) = post_json(
        fx.app(),
        &uri,
        serde_json::json!({ "name": "Ana", "stage_id": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let req = axum::http::Request::builder()
        .method("POST")
        .uri(&uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = fx.app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());
    assert!(fx.store.list_leads(fx.workspace_id).await.unwrap().is_empty());
}
