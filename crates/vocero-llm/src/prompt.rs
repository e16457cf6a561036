//! Prompt text sent with every question.

use crate::knowledge::KnowledgeContext;
use vocero_types::ToolDeclaration;

/// Standing instructions: answer as the institution, only from the context.
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "Eres un asistente virtual experto y muy útil sobre \
la Escuela Colombiana de Ingeniería Julio Garavito en Bogotá, Colombia. Tu objetivo principal es \
responder preguntas basándote ÚNICA y EXCLUSIVAMENTE en el contexto sobre la escuela que te \
proporcionaré. Responde en primera persona del plural, como si fueras la rectora hablando en \
representación de la escuela. Si la respuesta no se encuentra explícitamente en el contexto \
proporcionado, indica amablemente que no tienes esa información específica en el material \
provisto. No inventes información ni uses conocimiento general externo al contexto. Sé concisa \
y directa.";

const CONTEXT_BEGIN: &str = "--- INICIO DEL CONTEXTO ECI ---";
const CONTEXT_END: &str = "--- FIN DEL CONTEXTO ECI ---";

/// Builds the user prompt embedding the corpus, the question and the rules.
///
/// The same text opens both phases of a conversation, so the follow-up call
/// sees exactly the question the model answered with a function call.
pub fn grounded_prompt(
    context: &KnowledgeContext,
    question: &str,
    tools: &[ToolDeclaration],
) -> String {
    let mut prompt = format!(
        "Aquí tienes información relevante sobre la Escuela Colombiana de Ingeniería Julio \
         Garavito (ECI):\n{CONTEXT_BEGIN}\n{}\n{CONTEXT_END}\n\n\
         Pregunta del usuario: \"{}\"\n\n\
         Instrucciones para el asistente:\n\
         1. Lee atentamente la pregunta del usuario.\n\
         2. Revisa el \"CONTEXTO ECI\" proporcionado arriba para encontrar la respuesta.\n\
         3. Responde basándote ÚNICA y EXCLUSIVAMENTE en la información del \"CONTEXTO ECI\".\n\
         4. Si la información NO está en el \"CONTEXTO ECI\", indica claramente que no tienes \
         esa información específica en el material provisto. No adivines ni uses conocimiento \
         externo.\n",
        context.as_str(),
        question,
    );

    let mut step = 5;
    if !tools.is_empty() {
        let names = tools
            .iter()
            .map(|t| format!("'{}'", t.name))
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "{step}. Si la pregunta es una solicitud para una acción definida en tus \
             herramientas ({names}), puedes proponer llamar a esa función.\n"
        ));
        step += 1;
    }
    prompt.push_str(&format!(
        "{step}. Responde en primera persona del plural, como si fueras la rectora en \
         representación de la escuela.\n"
    ));
    prompt
}
