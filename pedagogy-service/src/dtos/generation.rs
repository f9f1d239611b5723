use crate::models::{GeneratedQuestion, QuestionDistribution};
use crate::services::analysis::DokStatistics;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BloomRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl BloomRequest {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("question")
    }
}

#[derive(Debug, Serialize)]
pub struct BloomResponse {
    pub success: bool,
    pub analysis: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BalanceRequest {
    #[serde(rename = "examContent", default)]
    #[validate(length(min = 1, message = "examContent is required"))]
    pub exam_content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl BalanceRequest {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("examen")
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub analysis: String,
    pub statistics: DokStatistics,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ElevateDok3Request {
    #[serde(default)]
    #[validate(length(min = 1, message = "objetivo_simple is required"))]
    pub objetivo_simple: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ElevateDok3Response {
    pub success: bool,
    pub objetivo_dok3: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RubricRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "criterio is required"))]
    pub criterio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 10, message = "niveles must be between 1 and 10"))]
    pub niveles: Option<u32>,
    #[serde(
        rename = "descripción",
        alias = "descripcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub objetivos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asignatura: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl RubricRequest {
    pub const DEFAULT_LEVELS: u32 = 4;

    pub fn levels(&self) -> u32 {
        self.niveles.unwrap_or(Self::DEFAULT_LEVELS)
    }

    pub fn parameters(&self) -> RubricParameters {
        RubricParameters {
            criterio: self.criterio.clone(),
            niveles: self.levels(),
            objetivos: self.objetivos.clone(),
            competencia: self.competencia.clone().unwrap_or_default(),
            asignatura: self.asignatura.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RubricParameters {
    pub criterio: String,
    pub niveles: u32,
    pub objetivos: Vec<String>,
    pub competencia: String,
    pub asignatura: String,
}

#[derive(Debug, Serialize)]
pub struct RubricResponse {
    pub success: bool,
    pub rubric: String,
    pub parameters: RubricParameters,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuestionsRequest {
    #[serde(rename = "objetivoAprendizaje", default)]
    #[validate(length(min = 1, message = "objetivoAprendizaje is required"))]
    pub objetivo_aprendizaje: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asignatura: Option<String>,
    #[serde(
        rename = "nivelEducativo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub nivel_educativo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dificultad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl QuestionsRequest {
    pub fn difficulty(&self) -> &str {
        self.dificultad.as_deref().unwrap_or("intermedio")
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionsMetadata {
    pub objetivo: String,
    pub asignatura: String,
    #[serde(rename = "nivelEducativo")]
    pub nivel_educativo: String,
    pub dificultad: String,
    #[serde(rename = "totalPreguntas")]
    pub total_preguntas: u8,
    #[serde(rename = "distribucionDok")]
    pub distribucion_dok: QuestionDistribution,
}

impl QuestionsMetadata {
    pub fn for_request(request: &QuestionsRequest) -> Self {
        let distribution = QuestionDistribution::STANDARD;
        Self {
            objetivo: request.objetivo_aprendizaje.clone(),
            asignatura: request.asignatura.clone().unwrap_or_default(),
            nivel_educativo: request.nivel_educativo.clone().unwrap_or_default(),
            dificultad: request.difficulty().to_string(),
            total_preguntas: distribution.total(),
            distribucion_dok: distribution,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub success: bool,
    pub preguntas: Vec<GeneratedQuestion>,
    pub metadata: QuestionsMetadata,
    pub timestamp: String,
}
