use completion_client::CompletionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeadflowError {
    #[error("Workspace não encontrado: {0}")]
    WorkspaceNotFound(String),

    #[error("Lead não encontrado")]
    LeadNotFound(String),

    #[error("Campanha não encontrada")]
    CampaignNotFound(String),

    #[error("Etapa não encontrada: {0}")]
    StageNotFound(String),

    #[error("Mensagem não encontrada: {0}")]
    MessageNotFound(String),

    #[error("etapa {stage} não pertence ao workspace {workspace}")]
    StageOutsideWorkspace { stage: String, workspace: String },

    #[error("Preencha os campos obrigatórios para mover para \"{stage}\": {}", .fields.join(", "))]
    MissingRequiredFields { stage: String, fields: Vec<String> },

    #[error("{0}")]
    InvalidLead(String),

    #[error("{0}")]
    InvalidCampaign(String),

    #[error("{0}")]
    InvalidWorkspace(String),

    #[error("variante {index} não existe nesta mensagem")]
    InvalidVariant { index: usize },

    #[error("campo desconhecido para o workspace: {0}")]
    UnknownField(String),

    #[error("convite inválido: {0}")]
    InvalidInvite(String),

    #[error("valor inválido '{value}' para {kind}")]
    InvalidEnum { kind: &'static str, value: String },

    #[error("nenhuma mensagem utilizável na resposta do modelo")]
    EmptyGeneration,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("falha no armazenamento: {0}")]
    StoreFault(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LeadflowError>;
