//! Sample workspace for `leadflow serve --memory --seed`.

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::campaign::Campaign;
use crate::error::{LeadflowError, Result};
use crate::lead::Lead;
use crate::stage::CustomField;
use crate::store::Store;
use crate::types::CustomFieldType;
use crate::workspace::create_workspace;

/// Ids of what [`seed`] created, printed so a user can start issuing requests.
#[derive(Debug, Clone, Serialize)]
pub struct DemoIds {
    pub workspace_id: Uuid,
    pub owner_id: Uuid,
    pub stage_ids: Vec<(String, Uuid)>,
    pub lead_ids: Vec<Uuid>,
    pub campaign_ids: Vec<Uuid>,
}

pub async fn seed(store: &dyn Store) -> Result<DemoIds> {
    let owner = Uuid::new_v4();
    let (workspace, stages) = create_workspace(store, "Demonstração", owner).await?;
    let ws = workspace.id;

    let budget = CustomField::new(ws, "Orçamento", CustomFieldType::Number);
    let sector = CustomField::select(
        ws,
        "Setor",
        vec!["Varejo".into(), "Saúde".into(), "Indústria".into()],
    );
    store.insert_custom_field(&budget).await?;
    store.insert_custom_field(&sector).await?;

    let stage = |name: &str| {
        stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .ok_or_else(|| LeadflowError::StageNotFound(name.to_string()))
    };
    let contato = stage("Contato")?;
    let proposta = stage("Proposta")?;
    store
        .set_required_fields(contato, &["phone".to_string()])
        .await?;
    store
        .set_required_fields(
            proposta,
            &["email".to_string(), "company".to_string(), budget.name.clone()],
        )
        .await?;

    let welcome = Campaign::new(
        ws,
        "Primeiro contato",
        "Software de gestão para pequenos comércios, teste grátis de 14 dias.",
        "Tom próximo e direto, até 3 frases, termine com uma pergunta.",
    )
    .triggered_by(contato);
    let follow_up = Campaign::new(
        ws,
        "Follow-up de proposta",
        "Proposta comercial enviada há uma semana sem resposta.",
        "Lembre a proposta sem pressionar e ofereça uma ligação curta.",
    );
    store.insert_campaign(&welcome).await?;
    store.insert_campaign(&follow_up).await?;

    let mut ana = Lead::new(ws, stage("Novo")?, "Ana Lima");
    ana.email = Some("ana@padarialima.com.br".into());
    ana.company = Some("Padaria Lima".into());
    ana.source = Some("Instagram".into());
    ana.custom_data.insert("Setor".into(), json!("Varejo"));

    let mut rui = Lead::new(ws, contato, "Rui Campos");
    rui.phone = Some("+55 11 98888-1234".into());
    rui.position = Some("Diretor".into());

    for lead in [&ana, &rui] {
        store.insert_lead(lead).await?;
    }

    Ok(DemoIds {
        workspace_id: ws,
        owner_id: owner,
        stage_ids: stages.iter().map(|s| (s.name.clone(), s.id)).collect(),
        lead_ids: vec![ana.id, rui.id],
        campaign_ids: vec![welcome.id, follow_up.id],
    })
}
