//! Prompt templates.
//!
//! Every generation prompt starts from the same Depth of Knowledge framing so
//! the model classifies and writes against Webb's four levels.

use crate::dtos::{
    BalanceRequest, BloomRequest, ElevateDok3Request, EvaluationRequest, QuestionsRequest,
    RubricRequest,
};

pub const DOK_CONTEXT: &str = "
Usted es un experto en pedagogía y debe generar preguntas o análisis basados estrictamente en el marco de Profundidad del Conocimiento (DOK) de Norman Webb.

DOK Nivel 1 (Pensamiento Memorístico): Implica recordar hechos, definiciones y realizar procedimientos rutinarios de un solo paso.

DOK Nivel 2 (Habilidades y Conceptos): Requiere aplicar conocimientos para procesar información, comparar, clasificar o realizar tareas de varios pasos.

DOK Nivel 3 (Pensamiento Estratégico): Involucra razonamiento, planificación y uso de evidencia para resolver problemas complejos y abstractos que a menudo no tienen una única respuesta correcta.

DOK Nivel 4 (Pensamiento Extendido): Exige razonamiento complejo, investigación, síntesis de ideas de múltiples fuentes y creación de algo nuevo, generalmente a lo largo de un período de tiempo extendido.
";

pub fn bloom_analysis(request: &BloomRequest) -> String {
    format!(
        "{DOK_CONTEXT}

Analice el siguiente {kind} y proporcione un análisis detallado que incluya:

1. Clasificación según la Taxonomía de Bloom
2. Nivel DOK (1-4) con justificación
3. Recomendaciones pedagógicas
4. Sugerencias de mejora si aplica

Formato de respuesta: JSON con estructura clara y análisis comprensible para docentes.

Contenido a analizar: {content}",
        kind = request.kind(),
        content = request.content,
    )
}

pub fn balance_analysis(request: &BalanceRequest) -> String {
    format!(
        "{DOK_CONTEXT}

Analice el siguiente {kind} y proporcione un análisis completo de balance cognitivo que incluya:

1. Distribución de preguntas por nivel DOK (1-4)
2. Porcentajes de distribución
3. Evaluación del equilibrio cognitivo
4. Recomendaciones específicas para mejorar el balance
5. Sugerencias de preguntas adicionales si es necesario
6. Análisis de la progresión lógica entre niveles

Formato de respuesta: JSON estructurado con análisis detallado, estadísticas claras y recomendaciones accionables para docentes.

{kind} a analizar:
{content}",
        kind = request.kind(),
        content = request.exam_content,
    )
}

pub fn elevate_to_dok3(request: &ElevateDok3Request) -> String {
    let context = match request.contexto.as_deref() {
        Some(c) if !c.is_empty() => format!("Contexto adicional: {}", c),
        _ => String::new(),
    };

    format!(
        "Eres un experto en diseño curricular chileno y experto en niveles DOK (Depth of Knowledge).

Transforma el siguiente objetivo de aprendizaje simple a nivel DOK 3 (Pensamiento Estratégico), manteniendo la esencia del contenido pero elevando la profundidad cognitiva.

Objetivo Original: {objective}

{context}

**Requisitos para DOK 3:**
- Requiere planificación estratégica o formulación de estrategias
- Debe involucrar investigación y toma de decisiones
- Incluye múltiples variables complejas
- Demuestra autorregulación y metacognición

El resultado debe:
1. Mantener la alineación con el currículum chileno
2. Especificar claramente los aprendizajes esperados
3. Incluir criterios observables de logro
4. Ser apropiado para el nivel educativo

Proporciona solo el objetivo transformado, sin explicaciones adicionales.",
        objective = request.objetivo_simple,
    )
}

pub fn rubric(request: &RubricRequest) -> String {
    let levels = request.levels();
    let focus = if levels == RubricRequest::DEFAULT_LEVELS {
        "Distribución equilibrada entre niveles DOK"
    } else {
        "Enfoque pedagógico apropiado"
    };

    format!(
        "{DOK_CONTEXT}

Genere una rúbrica de evaluación detallada y estructurada que incluya:

1. Criterio de evaluación claramente definido
2. {levels} niveles de desempeño (Excelente, Bueno, Satisfactorio, Necesita Mejorar)
3. Descriptores específicos para cada nivel
4. {focus}
5. Criterios observables y medibles
6. Conexión con objetivos de aprendizaje cuando corresponda

Formato de respuesta: JSON estructurado con rúbrica completa y lista para usar en el aula.


Criterio: {criterio}
Niveles: {levels}
Descripción: {descripcion}
Objetivos de aprendizaje: {objetivos}
Competencia: {competencia}
Asignatura: {asignatura}

Genere la rúbrica considerando el marco pedagógico del Colegio Madre Paulina.",
        criterio = request.criterio,
        descripcion = request.descripcion.as_deref().unwrap_or_default(),
        objetivos = request.objetivos.join(", "),
        competencia = request.competencia.as_deref().unwrap_or_default(),
        asignatura = request.asignatura.as_deref().unwrap_or_default(),
    )
}

pub fn questions_for_objective(request: &QuestionsRequest) -> String {
    format!(
        "{DOK_CONTEXT}

Su respuesta DEBE ser un array JSON de exactamente 4 objetos. Cada objeto debe tener las claves: \"pregunta\" (string), \"nivel_dok\" (int: 1, 2, o 3).

IMPORTANTE: Para cada objetivo de aprendizaje proporcionado, genere exactamente:
- 2 preguntas de DOK 3 (Pensamiento Estratégico)
- 1 pregunta de DOK 2 (Habilidades y Conceptos)
- 1 pregunta de DOK 1 (Pensamiento Memorístico)

Las preguntas deben ser pedagógicamente apropiadas para el contexto educativo chileno y alinearse con los estándares curriculares.


Objetivo de aprendizaje: {objetivo}
Asignatura: {asignatura}
Nivel educativo: {nivel}
Contexto adicional: {contexto}
Dificultad preferida: {dificultad}

Genere las 4 preguntas específicas siguiendo la distribución DOK requerida.",
        objetivo = request.objetivo_aprendizaje,
        asignatura = request.asignatura.as_deref().unwrap_or_default(),
        nivel = request.nivel_educativo.as_deref().unwrap_or_default(),
        contexto = request.contexto.as_deref().unwrap_or_default(),
        dificultad = request.difficulty(),
    )
}

pub fn evaluation(request: &EvaluationRequest) -> String {
    let objectives = request
        .objectives()
        .iter()
        .map(|o| format!("• {}", o))
        .collect::<Vec<_>>()
        .join("\n");

    let or_none = |value: &Option<String>, fallback: &'static str| -> String {
        match value.as_deref() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => fallback.to_string(),
        }
    };

    format!(
        "{DOK_CONTEXT}

Genere una evaluación completa y estructurada que incluya:

1. **Título de la evaluación**
2. **Objetivos de aprendizaje claramente definidos**
3. **Instrucciones para estudiantes**
4. **Distribución DOK equilibrada:**
   - 40% DOK 1 (Pensamiento Memorístico)
   - 35% DOK 2 (Habilidades y Conceptos)
   - 25% DOK 3 (Pensamiento Estratégico)
5. **Preguntas diversificadas** (opción múltiple, desarrollo, análisis, síntesis)
6. **Criterios de evaluación específicos**
7. **Tiempo estimado de aplicación**
8. **Indicaciones especiales** si aplica

La evaluación debe ser apropiada para el contexto educativo chileno y alinearse con estándares curriculares nacionales.


**Título:** {titulo}

**Objetivos de Aprendizaje:**
{objectives}

**Contenido a evaluar:**
{contenido}

**Instrucciones adicionales:**
{instrucciones}

**Tiempo estimado:** {tiempo}

**Instrucciones especiales:**
{especiales}

Genere la evaluación completa con todos los componentes requeridos.",
        titulo = request.titulo,
        contenido = request.contenido,
        instrucciones = or_none(&request.instrucciones, "Ninguna"),
        tiempo = or_none(&request.tiempo_estimado, "No especificado"),
        especiales = or_none(&request.instrucciones_especiales, "Ninguna"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json<T: serde::de::DeserializeOwned>(json: serde_json::Value) -> T {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn generation_prompts_start_with_dok_context() {
        let bloom: BloomRequest = from_json(serde_json::json!({"content": "¿Qué es un ecosistema?"}));
        let prompt = bloom_analysis(&bloom);
        assert!(prompt.starts_with(DOK_CONTEXT));
        assert!(prompt.contains("Analice el siguiente question"));
        assert!(prompt.ends_with("Contenido a analizar: ¿Qué es un ecosistema?"));
    }

    #[test]
    fn balance_prompt_names_the_document_kind() {
        let balance: BalanceRequest =
            from_json(serde_json::json!({"examContent": "1. ...", "type": "prueba"}));
        let prompt = balance_analysis(&balance);
        assert!(prompt.contains("prueba a analizar:\n1. ..."));
    }

    #[test]
    fn dok3_prompt_includes_context_only_when_given() {
        let without: ElevateDok3Request =
            from_json(serde_json::json!({"objetivo_simple": "Identificar las partes de la célula"}));
        assert!(!elevate_to_dok3(&without).contains("Contexto adicional"));

        let with: ElevateDok3Request = from_json(serde_json::json!({
            "objetivo_simple": "Identificar las partes de la célula",
            "contexto": "8° básico"
        }));
        assert!(elevate_to_dok3(&with).contains("Contexto adicional: 8° básico"));
    }

    #[test]
    fn rubric_prompt_joins_objectives_and_adapts_to_levels() {
        let rubric_request: RubricRequest = from_json(serde_json::json!({
            "criterio": "Argumentación",
            "objetivos": ["OA1", "OA2"]
        }));
        let prompt = rubric(&rubric_request);
        assert!(prompt.contains("Objetivos de aprendizaje: OA1, OA2"));
        assert!(prompt.contains("4 niveles de desempeño"));
        assert!(prompt.contains("Distribución equilibrada entre niveles DOK"));

        let three: RubricRequest =
            from_json(serde_json::json!({"criterio": "Argumentación", "niveles": 3}));
        assert!(rubric(&three).contains("Enfoque pedagógico apropiado"));
    }

    #[test]
    fn evaluation_prompt_lists_objectives_and_defaults() {
        let request: EvaluationRequest = from_json(serde_json::json!({
            "titulo": "Prueba de Ciencias",
            "objetivos": ["Describir la fotosíntesis", "Explicar la respiración celular"],
            "contenido": "Unidad 2"
        }));
        let prompt = evaluation(&request);
        assert!(prompt.contains("**Título:** Prueba de Ciencias"));
        assert!(prompt.contains("• Describir la fotosíntesis\n• Explicar la respiración celular"));
        assert!(prompt.contains("**Tiempo estimado:** No especificado"));
        assert!(prompt.contains("**Instrucciones adicionales:**\nNinguna"));
        assert!(prompt.contains("40% DOK 1"));
    }
}
