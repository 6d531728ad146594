//! Preenchimento de formulários pelo terminal.
//!
//! `wizard-cli <desvio|interacao|inspecao> [--offline] [--user <ID>] [--checklist <ARQUIVO>]`
//!
//! Con `SAFETY_API_URL` configurada usa la API remota; si no (o con
//! `--offline`) guarda los borradores en memoria. La inspección toma las
//! preguntas de `--checklist` (lista JSON) o, en modo remoto, del catálogo.
//! Comandos durante la conversación: `:voltar`, `:salvar`, `:sair` y, en la
//! inspección, `:plano <pergunta>` para registrar un plan de acción.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use log::{info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use wizard_core::constants::DEFAULT_DEBOUNCE_MS;
use wizard_core::{Conversation, FieldKind, FieldValue, FinalSubmission, InMemoryEventStore, Prompt, RenamedSubmission,
                  RequestContext, Turn, ValidationErrors, WizardController, WizardDefinition};
use wizard_domain::wizards::{incident, inspection, interaction};
use wizard_domain::{ActionItem, ActionStatus, InspectionChecklist, InspectionSubmission, OptionFilter, OptionKind,
                    Priority, Question, ReferenceOption};
use wizard_remote::{ApiClient, ApiConfig, CollectingNotifier, DraftGateway, FinalizeResult, HttpDraftGateway,
                    InMemoryDraftGateway, LoadOutcome, NoticeLevel, OptionLoader, WizardRuntime};

const USAGE: &str =
    "Uso: wizard-cli <desvio|interacao|inspecao> [--offline] [--user <ID>] [--checklist <ARQUIVO>]";
const MAX_LISTED_OPTIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    wizard: String,
    offline: bool,
    user: String,
    checklist: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut wizard: Option<String> = None;
    let mut offline = false;
    let mut user = "cli".to_string();
    let mut checklist = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--offline" => offline = true,
            "--user" => user = rest.next().ok_or("--user exige um valor")?.clone(),
            "--checklist" => checklist = Some(rest.next().ok_or("--checklist exige um arquivo")?.clone()),
            flag if flag.starts_with("--") => return Err(format!("opção desconhecida: {flag}")),
            other if wizard.is_none() => wizard = Some(other.to_string()),
            other => return Err(format!("argumento inesperado: {other}")),
        }
    }
    let wizard = wizard.ok_or("informe o wizard")?;
    Ok(CliArgs { wizard,
                 offline,
                 user,
                 checklist })
}

enum Submission {
    Renamed(RenamedSubmission),
    /// Las preguntas definen el paso `perguntas` y el chequeo de planes.
    Inspection(InspectionChecklist),
}

struct WizardChoice {
    definition: WizardDefinition,
    collection: &'static str,
    submission: Submission,
}

fn choose(name: &str, questions: Option<Vec<Question>>) -> Result<WizardChoice, String> {
    let (definition, collection, submission) = match name {
        incident::NAME => (incident::definition(), incident::COLLECTION, Submission::Renamed(incident::submission())),
        interaction::NAME => (interaction::definition(),
                              interaction::COLLECTION,
                              Submission::Renamed(interaction::submission())),
        inspection::NAME => {
            let questions = questions.filter(|q| !q.is_empty())
                                     .ok_or("inspeção exige perguntas (--checklist ou API configurada)")?;
            (inspection::definition(&questions),
             inspection::COLLECTION,
             Submission::Inspection(InspectionChecklist::new(questions)))
        }
        other => return Err(format!("wizard desconhecido: {other}")),
    };
    let definition = definition.map_err(|e| e.to_string())?;
    Ok(WizardChoice { definition,
                      collection,
                      submission })
}

fn questions_from(records: &[Value]) -> Vec<Question> { records.iter().filter_map(Question::from_json).collect() }

async fn questions_from_file(path: &str) -> Result<Vec<Question>, String> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| format!("{path}: {e}"))?;
    let records: Vec<Value> = serde_json::from_str(&raw).map_err(|e| format!("{path}: {e}"))?;
    Ok(questions_from(&records))
}

async fn load_questions(args: &CliArgs, client: Option<&ApiClient>) -> Result<Option<Vec<Question>>, String> {
    if args.wizard != inspection::NAME {
        return Ok(None);
    }
    if let Some(path) = &args.checklist {
        return questions_from_file(path).await.map(Some);
    }
    match client {
        Some(client) => {
            let records = client.list(inspection::QUESTIONS_COLLECTION, &[]).await.map_err(|e| e.to_string())?;
            Ok(Some(questions_from(&records)))
        }
        None => Ok(None),
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("[wizard] {message}\n{USAGE}");
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let raw: Vec<String> = std::env::args().collect();
    let args = parse_args(&raw).unwrap_or_else(|e| usage_error(&e));
    let ctx = RequestContext::new(args.user.clone(), "default").with_all_permissions();

    let config = if args.offline {
        None
    } else {
        match ApiConfig::from_env() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("{e}; usando modo offline");
                None
            }
        }
    };
    let client = match &config {
        Some(config) => match ApiClient::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                eprintln!("[wizard] {e}");
                std::process::exit(5);
            }
        },
        None => None,
    };

    let questions = match load_questions(&args, client.as_ref()).await {
        Ok(questions) => questions,
        Err(e) => {
            eprintln!("[wizard] perguntas: {e}");
            std::process::exit(5);
        }
    };
    let choice = choose(&args.wizard, questions).unwrap_or_else(|e| usage_error(&e));

    let code = match (client, config) {
        (Some(client), Some(config)) => {
            info!("modo remoto base_url={}", client.base_url());
            let options = OptionLoader::new(client.clone(), Arc::new(CollectingNotifier::new()));
            run(Arc::new(HttpDraftGateway::new(client)), Some(options), choice, ctx, config.debounce).await
        }
        _ => {
            let debounce = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
            run(Arc::new(InMemoryDraftGateway::new()), None, choice, ctx, debounce).await
        }
    };
    std::process::exit(code);
}

enum Input {
    Line(String),
    Back,
    Save,
    Quit,
    /// `:plano <pergunta>`; `None` si el id no es válido.
    Plan(Option<i64>),
}

fn parse_plan_command(line: &str) -> Option<Option<i64>> {
    let rest = line.trim().strip_prefix(":plano")?;
    Some(rest.trim().parse().ok())
}

async fn read_input(lines: &mut Lines<BufReader<Stdin>>) -> Input {
    match lines.next_line().await {
        Ok(Some(line)) => match line.trim() {
            ":voltar" => Input::Back,
            ":salvar" => Input::Save,
            ":sair" => Input::Quit,
            other => match parse_plan_command(other) {
                Some(question) => Input::Plan(question),
                None => Input::Line(line),
            },
        },
        Ok(None) => Input::Quit,
        Err(e) => {
            warn!("stdin: {e}");
            Input::Quit
        }
    }
}

async fn run<G: DraftGateway + 'static>(gateway: Arc<G>,
                                        options: Option<OptionLoader<ApiClient>>,
                                        choice: WizardChoice,
                                        ctx: RequestContext,
                                        debounce: Duration)
                                        -> i32 {
    let notifier = Arc::new(CollectingNotifier::new());
    let controller = WizardController::new(Arc::new(choice.definition), InMemoryEventStore::default());
    let rt = WizardRuntime::new(controller, gateway, choice.collection, ctx, notifier.clone(), debounce);
    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown_step: Option<usize> = None;

    loop {
        print_notices(&notifier);
        let (step_index, title) = rt.read(|c| (c.session().current_step(), c.current_step().title().to_string())).await;
        if shown_step != Some(step_index) {
            println!("\n== {title} ==");
            shown_step = Some(step_index);
        }

        let prompt = rt.read(|c| conversation.next_prompt(c)).await;
        let Some(prompt) = prompt else {
            match rt.update(|c| conversation.proceed(c)).await.and_then(|r| r) {
                Ok(Turn::ReadyToFinalize) => {
                    println!("Formulário completo. Enviar agora? [s/n]");
                    match read_input(&mut lines).await {
                        Input::Line(l) if matches!(l.trim(), "s" | "sim") => {
                            let code =
                                finalize(&rt, &choice.submission, options.as_ref(), &mut conversation, &notifier).await;
                            if let Some(code) = code {
                                return code;
                            }
                        }
                        Input::Line(_) => {}
                        Input::Back => go_back(&rt).await,
                        Input::Save => save(&rt).await,
                        Input::Quit => return quit(&rt).await,
                        Input::Plan(question) => add_plan(&rt, &choice.submission, question, &mut lines).await,
                    }
                }
                Ok(turn) => show_turn(&rt, turn).await,
                Err(e) => eprintln!("[wizard] {e}"),
            }
            continue;
        };

        if let Some(loader) = &options {
            list_options(&rt, loader, &prompt.field).await;
        }
        print_prompt(&prompt);
        let line = match read_input(&mut lines).await {
            Input::Line(line) => line,
            Input::Back => {
                go_back(&rt).await;
                continue;
            }
            Input::Save => {
                save(&rt).await;
                continue;
            }
            Input::Quit => return quit(&rt).await,
            Input::Plan(question) => {
                add_plan(&rt, &choice.submission, question, &mut lines).await;
                continue;
            }
        };

        let turn = rt.update(|c| conversation.answer(c, &prompt.field, &line)).await.and_then(|r| r);
        match turn {
            Ok(Turn::ReadyToFinalize) => {}
            Ok(turn) => show_turn(&rt, turn).await,
            Err(e) => eprintln!("[wizard] {e}"),
        }
    }
}

async fn show_turn<G: DraftGateway + 'static>(rt: &WizardRuntime<G>, turn: Turn) {
    match turn {
        Turn::Continue => {
            if rt.read(|c| c.session().remote_id().is_some()).await {
                rt.schedule_save();
            }
        }
        Turn::Advanced { to } => {
            info!("advanced to={to}");
            // Los errores de guardado llegan como aviso.
            let _ = rt.save_draft().await;
        }
        Turn::Rejected(errors) => print_errors(&errors),
        Turn::InvalidInput { field, reason } => println!("  ! {field}: {reason}"),
        Turn::ReadyToFinalize => {}
    }
}

/// Usuarios para el nombre del responsable en los planes. Sin API, vacío.
async fn users(options: Option<&OptionLoader<ApiClient>>) -> Vec<ReferenceOption> {
    let Some(loader) = options else {
        return Vec::new();
    };
    match loader.load(OptionKind::Usuarios, OptionFilter::new()).await {
        LoadOutcome::Applied(users) => users,
        LoadOutcome::Stale => loader.current(OptionKind::Usuarios),
    }
}

/// `Some(code)` cuando la sesión terminó.
async fn finalize<G: DraftGateway + 'static>(rt: &WizardRuntime<G>,
                                             submission: &Submission,
                                             options: Option<&OptionLoader<ApiClient>>,
                                             conversation: &mut Conversation,
                                             notifier: &CollectingNotifier)
                                             -> Option<i32> {
    let users = match submission {
        Submission::Inspection(_) => users(options).await,
        Submission::Renamed(_) => Vec::new(),
    };
    let result = match submission {
        Submission::Renamed(renamed) => rt.finalize(renamed).await,
        Submission::Inspection(checklist) => {
            let inspection = InspectionSubmission::new(checklist, &users);
            rt.finalize(&inspection as &dyn FinalSubmission).await
        }
    };
    match result {
        Ok(FinalizeResult::Finalized { record_id }) => {
            print_notices(notifier);
            println!("Registro {record_id} enviado.");
            Some(0)
        }
        Ok(FinalizeResult::Rejected(errors)) => {
            print_errors(&errors);
            if matches!(submission, Submission::Inspection(_)) {
                println!("  Use :plano <pergunta> para registrar um plano de ação.");
            }
            conversation.reopen(&errors);
            None
        }
        Err(e) => {
            eprintln!("[wizard] envio falhou: {e}");
            None
        }
    }
}

fn parse_priority(raw: &str) -> Option<Priority> {
    match raw.trim().to_lowercase().as_str() {
        "baixa" => Some(Priority::Baixa),
        "media" | "média" => Some(Priority::Media),
        "alta" => Some(Priority::Alta),
        _ => None,
    }
}

async fn ask(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Option<String> {
    println!("  {label}:");
    match read_input(lines).await {
        Input::Line(line) => Some(line.trim().to_string()),
        _ => None,
    }
}

/// Pide los datos de un plan de acción y lo registra en la sesión.
async fn add_plan<G: DraftGateway + 'static>(rt: &WizardRuntime<G>,
                                             submission: &Submission,
                                             question: Option<i64>,
                                             lines: &mut Lines<BufReader<Stdin>>) {
    let Submission::Inspection(checklist) = submission else {
        println!("  ! :plano só existe na inspeção");
        return;
    };
    let Some(question) = question.and_then(|id| checklist.question(id)) else {
        println!("  ! uso: :plano <pergunta>");
        return;
    };
    println!("Plano de ação para: {}", question.texto);
    let Some(item) = read_plan(question.id, lines).await else {
        println!("  ! plano cancelado");
        return;
    };
    let today = Local::now().date_naive();
    match rt.update(|c| checklist.add_action_item(c, item, today)).await {
        Ok(Ok(())) => println!("Plano registrado."),
        Ok(Err(e)) => println!("  ! {e}"),
        Err(e) => println!("  ! {e}"),
    }
}

async fn read_plan(question_id: i64, lines: &mut Lines<BufReader<Stdin>>) -> Option<ActionItem> {
    let descricao_desvio = ask(lines, "Descrição do desvio").await?;
    let o_que_fazer = ask(lines, "O que fazer").await?;
    let como_fazer = ask(lines, "Como fazer").await?;
    let responsavel_id = ask(lines, "Responsável (id)").await?.parse().ok()?;
    let prazo = NaiveDate::parse_from_str(&ask(lines, "Prazo (AAAA-MM-DD)").await?, "%Y-%m-%d").ok()?;
    let prioridade = parse_priority(&ask(lines, "Prioridade (baixa/media/alta)").await?)?;
    Some(ActionItem { pergunta_id: question_id,
                      descricao_desvio,
                      o_que_fazer,
                      como_fazer,
                      responsavel_id,
                      prazo,
                      prioridade,
                      status: ActionStatus::Pendente })
}

async fn go_back<G: DraftGateway + 'static>(rt: &WizardRuntime<G>) {
    if let Err(e) = rt.retreat().await {
        println!("  ! {e}");
    }
}

async fn save<G: DraftGateway + 'static>(rt: &WizardRuntime<G>) {
    match rt.save_draft().await {
        Ok(id) => println!("Rascunho salvo ({id})."),
        Err(e) => eprintln!("[wizard] {e}"),
    }
}

async fn quit<G: DraftGateway + 'static>(rt: &WizardRuntime<G>) -> i32 {
    rt.flush().await;
    if let Some(id) = rt.read(|c| c.session().remote_id().cloned()).await {
        println!("Rascunho {id} mantido para continuar depois.");
    }
    0
}

async fn list_options<G: DraftGateway + 'static>(rt: &WizardRuntime<G>, loader: &OptionLoader<ApiClient>, field: &str) {
    let Some(kind) = OptionKind::for_field(field) else {
        return;
    };
    let parent = match kind.parent_filter() {
        Some(parent_key) => {
            let value = rt.read(|c| c.get(parent_key).cloned()).await;
            match value {
                Some(FieldValue::Id(id)) => Some(id.to_string()),
                _ => None,
            }
        }
        None => None,
    };
    if let LoadOutcome::Applied(options) = loader.load_dependent(kind, parent.as_deref()).await {
        for option in options.iter().take(MAX_LISTED_OPTIONS) {
            println!("    [{}] {}", option.id, option.label);
        }
        if options.len() > MAX_LISTED_OPTIONS {
            println!("    ... +{}", options.len() - MAX_LISTED_OPTIONS);
        }
    }
}

fn print_prompt(prompt: &Prompt) {
    if let Some(error) = &prompt.error {
        println!("  ! {error}");
    }
    let hint = match &prompt.kind {
        FieldKind::Text => String::new(),
        FieldKind::Flag => " (s/n)".to_string(),
        FieldKind::Choice(options) => format!(" ({})", options.join("/")),
        FieldKind::Id => " (id)".to_string(),
        FieldKind::IdList => " (ids separados por vírgula)".to_string(),
    };
    match &prompt.current {
        Some(current) => println!("{}{hint} [{}]:", prompt.label, current.to_json()),
        None => println!("{}{hint}:", prompt.label),
    }
}

fn print_errors(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        println!("  ! {field}: {message}");
    }
}

fn print_notices(notifier: &CollectingNotifier) {
    for notice in notifier.take() {
        let tag = match notice.level {
            NoticeLevel::Info => "i",
            NoticeLevel::Warning => "aviso",
            NoticeLevel::Blocking => "ERRO",
        };
        println!("[{tag}] {}", notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("wizard-cli").chain(list.iter().copied()).map(str::to_string).collect()
    }

    #[test]
    fn parses_wizard_and_flags() {
        let parsed = parse_args(&args(&["inspecao", "--user", "42", "--offline", "--checklist", "c.json"])).expect("args");
        assert_eq!(parsed,
                   CliArgs { wizard: "inspecao".into(),
                             offline: true,
                             user: "42".into(),
                             checklist: Some("c.json".into()) });
        assert_eq!(parse_args(&args(&["desvio"])).expect("args").user, "cli");
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(parse_args(&args(&["desvio", "--user"])).is_err());
        assert!(parse_args(&args(&["inspecao", "--checklist"])).is_err());
        assert!(parse_args(&args(&["desvio", "--verbose"])).is_err());
        assert!(parse_args(&args(&["desvio", "interacao"])).is_err());
        assert!(parse_args(&args(&["--offline"])).is_err());
    }

    #[test]
    fn inspection_needs_questions() {
        assert!(choose(inspection::NAME, None).is_err());
        assert!(choose(inspection::NAME, Some(Vec::new())).is_err());
        let choice = choose(inspection::NAME, Some(vec![Question::new(1, "EPI em uso?", true)])).expect("choice");
        assert_eq!(choice.collection, inspection::COLLECTION);
        assert!(matches!(choice.submission, Submission::Inspection(_)));
        assert_eq!(choice.definition.index_of("perguntas"), Some(2));
        assert!(choose("outro", None).is_err());
    }

    #[test]
    fn plan_command_and_priority() {
        assert_eq!(parse_plan_command(":plano 10"), Some(Some(10)));
        assert_eq!(parse_plan_command(":plano x"), Some(None));
        assert_eq!(parse_plan_command("resposta"), None);
        assert_eq!(parse_priority("Média"), Some(Priority::Media));
        assert_eq!(parse_priority("urgente"), None);
    }

    #[test]
    fn questions_skip_unreadable_records() {
        let records = vec![serde_json::json!({"id": 1, "texto": "EPI em uso?", "bloqueante": true}),
                           serde_json::json!({"texto": "sem id"})];
        assert_eq!(questions_from(&records), vec![Question::new(1, "EPI em uso?", true)]);
    }
}
