use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Non-2xx answer from the provider. `message` is the provider's own
    /// `error.message`, or "Erro desconhecido" when the body had none.
    #[error("Erro na API OpenAI: {message}")]
    Api { status: u16, message: String },

    #[error("erro de rede: {0}")]
    Transport(String),

    #[error("tempo esgotado ao chamar a API")]
    Timeout,

    #[error("resposta inválida da API: {0}")]
    Decode(String),

    #[error("chave da API não configurada")]
    MissingApiKey,

    #[error("backend roteirizado sem respostas na fila")]
    Exhausted,
}
