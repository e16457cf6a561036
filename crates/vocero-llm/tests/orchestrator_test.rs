use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vocero_llm::{
    BlockReason, GenerationClient, GenerationRequest, GenerationTurn, KnowledgeContext, LlmError,
    Orchestrator, OrchestratorConfig, PriorTurn, RawGeneration, RequestedCall, ToolRegistry,
    OFFICIAL_WEBSITE_TOOL,
};
use vocero_types::{ToolDeclaration, Turn};

const CONTEXT: &str = "La Escuela Colombiana de Ingeniería fue fundada en 1972 en Bogotá.";

/// What the scripted client saw on one call.
#[derive(Debug, Clone)]
struct Recorded {
    turns: Vec<Turn>,
    system_instructions: String,
    tools: Vec<ToolDeclaration>,
}

enum Step {
    Reply(RawGeneration),
    Fail,
    Stall,
}

/// Generation client that plays back a fixed script and records every call.
struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<Recorded>>,
}

impl ScriptedClient {
    fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<RawGeneration, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().push(Recorded {
            turns: request.turns.to_vec(),
            system_instructions: request.system_instructions.to_string(),
            tools: request.tools.to_vec(),
        });
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted");
        match step {
            Step::Reply(raw) => Ok(raw),
            Step::Fail => Err(LlmError::Status {
                status: 503,
                message: "unavailable".to_string(),
            }),
            Step::Stall => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(RawGeneration::default())
            }
        }
    }
}

fn text(answer: &str) -> Step {
    Step::Reply(RawGeneration {
        text: Some(answer.to_string()),
        ..Default::default()
    })
}

fn model_turn(name: &str) -> PriorTurn {
    PriorTurn::new(json!({
        "role": "model",
        "parts": [{"functionCall": {"name": name, "args": {}}, "thoughtSignature": "opaque"}]
    }))
}

fn function_call(name: &str) -> Step {
    Step::Reply(RawGeneration {
        function_call: Some(RequestedCall {
            name: name.to_string(),
            args: Map::new(),
            model_turn: model_turn(name),
        }),
        ..Default::default()
    })
}

fn orchestrator(client: Arc<ScriptedClient>) -> Orchestrator {
    Orchestrator::new(OrchestratorConfig::new(
        KnowledgeContext::from_text(CONTEXT),
        client,
    ))
}

fn user_text(turn: &Turn) -> &str {
    match turn {
        Turn::User { text } => text,
        other => panic!("expected user turn, got {:?}", other),
    }
}

#[tokio::test]
async fn direct_answer_needs_one_call() {
    let client = ScriptedClient::new(vec![text("Fuimos fundados en 1972.")]);
    let orch = orchestrator(client.clone());

    let turn = orch.ask("¿Cuándo fue fundada la escuela?").await;

    assert_eq!(
        turn,
        GenerationTurn::DirectAnswer {
            text: "Fuimos fundados en 1972.".to_string()
        }
    );
    assert_eq!(client.calls(), 1);

    let recorded = client.recorded();
    assert_eq!(recorded[0].turns.len(), 1);
    let prompt = user_text(&recorded[0].turns[0]);
    assert!(prompt.contains(CONTEXT));
    assert!(prompt.contains("¿Cuándo fue fundada la escuela?"));
    assert_eq!(recorded[0].tools, ToolRegistry::institutional().declared_tools());
    assert_eq!(
        recorded[0].system_instructions,
        vocero_llm::DEFAULT_SYSTEM_INSTRUCTIONS
    );
}

#[tokio::test]
async fn website_question_runs_the_full_tool_round_trip() {
    let client = ScriptedClient::new(vec![
        function_call(OFFICIAL_WEBSITE_TOOL),
        text("Nuestro sitio web oficial es www.escuelaing.edu.co."),
    ]);
    let orch = orchestrator(client.clone());
    let question = "¿Cuál es la página web oficial?";

    let (tool_name, arguments, prior_turn) = match orch.ask(question).await {
        GenerationTurn::FunctionRequest {
            tool_name,
            arguments,
            prior_turn,
        } => (tool_name, arguments, prior_turn),
        other => panic!("expected FunctionRequest, got {:?}", other),
    };
    assert_eq!(tool_name, OFFICIAL_WEBSITE_TOOL);
    assert!(arguments.is_empty());

    let result = orch.dispatch(&tool_name, &arguments);
    let parsed: Value = serde_json::from_str(&result).unwrap();
    assert_eq!(
        parsed,
        json!({"website": "El sitio web oficial es www.escuelaing.edu.co"})
    );

    let final_turn = orch.resume(question, prior_turn, &tool_name, &result).await;
    match &final_turn {
        GenerationTurn::DirectAnswer { text } => assert!(text.contains("escuelaing.edu.co")),
        other => panic!("expected DirectAnswer, got {:?}", other),
    }
    assert_eq!(client.calls(), 2);

    // Phase two replays the phase-one prompt, the model turn and the result.
    let recorded = client.recorded();
    let follow_up = &recorded[1].turns;
    assert_eq!(follow_up.len(), 3);
    assert_eq!(follow_up[0], recorded[0].turns[0]);
    assert_eq!(follow_up[1], Turn::Model(model_turn(OFFICIAL_WEBSITE_TOOL)));
    assert_eq!(
        follow_up[2],
        Turn::FunctionResult {
            name: OFFICIAL_WEBSITE_TOOL.to_string(),
            response: parsed,
        }
    );
    assert_eq!(recorded[1].tools, recorded[0].tools);
}

#[tokio::test]
async fn invalid_tool_result_skips_the_service() {
    let client = ScriptedClient::new(vec![]);
    let orch = orchestrator(client.clone());

    let turn = orch
        .resume(
            "¿Cuál es la página web oficial?",
            model_turn(OFFICIAL_WEBSITE_TOOL),
            OFFICIAL_WEBSITE_TOOL,
            "{not json",
        )
        .await;

    assert_eq!(turn, GenerationTurn::blocked(BlockReason::InvalidToolResult));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn transport_failure_becomes_technical_error() {
    let client = ScriptedClient::new(vec![Step::Fail]);
    let orch = orchestrator(client.clone());

    let turn = orch.ask("¿Qué programas ofrecen?").await;
    assert_eq!(turn, GenerationTurn::blocked(BlockReason::TechnicalError));
}

#[tokio::test]
async fn slow_service_times_out_as_technical_error() {
    let client = ScriptedClient::new(vec![Step::Stall]);
    let orch = Orchestrator::new(
        OrchestratorConfig::new(KnowledgeContext::from_text(CONTEXT), client.clone())
            .with_call_timeout(Duration::from_millis(20)),
    );

    let turn = orch.ask("¿Qué programas ofrecen?").await;
    assert_eq!(turn, GenerationTurn::blocked(BlockReason::TechnicalError));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn missing_knowledge_file_still_answers() {
    let dir = tempfile::tempdir().unwrap();
    let context = KnowledgeContext::load(dir.path().join("informacion_eci.txt"));
    assert!(context.is_placeholder());

    let client = ScriptedClient::new(vec![text("No tenemos esa información en el material provisto.")]);
    let orch = Orchestrator::new(OrchestratorConfig::new(context.clone(), client.clone()));

    let turn = orch.ask("¿Quién ganó el mundial?").await;
    assert_eq!(turn.kind(), "direct_answer");
    let prompt = user_text(&client.recorded()[0].turns[0]).to_string();
    assert!(prompt.contains(context.as_str()));
}

#[tokio::test]
async fn empty_question_is_accepted() {
    let client = ScriptedClient::new(vec![text("¿En qué podemos ayudarte?")]);
    let orch = orchestrator(client.clone());

    let turn = orch.ask("   ").await;
    assert_eq!(turn.kind(), "direct_answer");
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn repeated_questions_classify_the_same_way() {
    let client = ScriptedClient::new(vec![
        text("Fuimos fundados en 1972."),
        text("La escuela se fundó en 1972."),
    ]);
    let orch = orchestrator(client);

    let first = orch.ask("¿Cuándo fue fundada?").await;
    let second = orch.ask("¿Cuándo fue fundada?").await;
    assert_eq!(first.kind(), second.kind());
}

#[tokio::test]
async fn answer_without_tool_is_a_single_phase() {
    let client = ScriptedClient::new(vec![text(
        "No tenemos esa información específica en el material provisto.",
    )]);
    let orch = orchestrator(client.clone());

    let outcome = orch.answer("¿Cuál es el precio del dólar hoy?").await;
    assert!(outcome.is_answered());
    assert!(outcome.tool_invoked.is_none());
    assert!(outcome.text().contains("esa información"));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn answer_runs_tool_and_resumes() {
    let client = ScriptedClient::new(vec![
        function_call(OFFICIAL_WEBSITE_TOOL),
        text("Puedes visitarnos en www.escuelaing.edu.co."),
    ]);
    let orch = orchestrator(client.clone());

    let outcome = orch.answer("¿Cuál es la página web oficial?").await;
    assert!(outcome.is_answered());
    assert_eq!(outcome.tool_invoked.as_deref(), Some(OFFICIAL_WEBSITE_TOOL));
    assert!(outcome.text().contains("www.escuelaing.edu.co"));
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn answer_feeds_unknown_tool_error_back_to_the_model() {
    let client = ScriptedClient::new(vec![
        function_call("get_cafeteria_menu"),
        text("No podemos consultar el menú en este momento."),
    ]);
    let orch = orchestrator(client.clone());

    let outcome = orch.answer("¿Qué hay de almuerzo?").await;
    assert!(outcome.is_answered());
    assert_eq!(outcome.tool_invoked.as_deref(), Some("get_cafeteria_menu"));

    match &client.recorded()[1].turns[2] {
        Turn::FunctionResult { name, response } => {
            assert_eq!(name, "get_cafeteria_menu");
            assert_eq!(response["error"], "unknown tool get_cafeteria_menu");
        }
        other => panic!("expected function result, got {:?}", other),
    }
}

#[tokio::test]
async fn answer_stops_a_repeated_function_request() {
    let client = ScriptedClient::new(vec![
        function_call(OFFICIAL_WEBSITE_TOOL),
        function_call(OFFICIAL_WEBSITE_TOOL),
    ]);
    let orch = orchestrator(client.clone());

    let outcome = orch.answer("¿Cuál es la página web oficial?").await;
    assert_eq!(outcome.block_reason(), Some(&BlockReason::ToolLoop));
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn blocked_phase_two_is_reported() {
    let client = ScriptedClient::new(vec![
        function_call(OFFICIAL_WEBSITE_TOOL),
        Step::Reply(RawGeneration {
            block_reason: Some("SAFETY".to_string()),
            ..Default::default()
        }),
    ]);
    let orch = orchestrator(client);

    let outcome = orch.answer("¿Cuál es la página web oficial?").await;
    assert_eq!(
        outcome.block_reason(),
        Some(&BlockReason::Content("SAFETY".to_string()))
    );
    assert!(outcome.text().contains("SAFETY"));
}
