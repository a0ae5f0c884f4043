use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{middleware, web, App, FromRequest, HttpRequest, HttpResponse, HttpServer};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use tracing::{info, warn};

use crate::auth::{AuthError, CredentialStore, Role, SessionRegistry, User};
use crate::batch;
use crate::config::AppConfig;
use crate::dashboard;
use crate::error::ApiError;
use crate::i18n::{text, Language, TextKey};
use crate::model::{RiskModelAdapter, RiskPredictor};
use crate::observations::{self, DateRange, ObservationEntry, ParentObservation};
use crate::pipeline::{assess, Assessment, AssessmentRequest, PredictionResult, RequestContext};
use crate::resources::{self, DifficultyArea, UnknownArea};
use crate::risk::{recommend, RiskTier};
use crate::store::{JsonStore, StoreError};

/// Shared across workers. Only the session registry mutates in memory.
pub struct AppState {
    pub model: RiskModelAdapter,
    pub predictions: JsonStore<PredictionResult>,
    pub observations: JsonStore<ParentObservation>,
    pub credentials: CredentialStore,
    pub sessions: SessionRegistry,
}

pub fn build_state(config: &AppConfig) -> Result<AppState, StoreError> {
    Ok(AppState {
        model: RiskModelAdapter::load_or_sample(&config.model_path),
        predictions: JsonStore::new(config.predictions_path()),
        observations: JsonStore::new(config.observations_path()),
        credentials: CredentialStore::open(&config.users_path())?,
        sessions: SessionRegistry::new(),
    })
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// `?lang=` wins over `Accept-Language`; English otherwise.
fn request_language(req: &HttpRequest) -> Language {
    let from_query = web::Query::<LangQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.lang.as_deref().and_then(Language::from_code));
    let from_header = || {
        req.headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(Language::from_code)
    };
    from_query.or_else(from_header).unwrap_or_default()
}

/// An authenticated request: the bearer token resolved to a user.
pub struct Session {
    pub token: String,
    pub user: User,
    pub context: RequestContext,
}

impl FromRequest for Session {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_session(req))
    }
}

fn resolve_session(req: &HttpRequest) -> Result<Session, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state is not configured".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthenticated)?;

    let user = state.sessions.resolve(token).ok_or(AuthError::Unauthenticated)?;
    let context = RequestContext::new(request_language(req)).with_user(user.username.clone());
    Ok(Session {
        token: token.to_string(),
        user,
        context,
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: User,
    message: &'static str,
}

async fn login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = state.credentials.authenticate(body.username.trim(), &body.password)?;
    let token = state.sessions.issue(user.clone());
    info!("User '{}' logged in", user.username);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user,
        message: text(TextKey::Welcome, request_language(&req)),
    }))
}

async fn logout(session: Session, state: web::Data<AppState>) -> HttpResponse {
    state.sessions.revoke(&session.token);
    info!("User '{}' logged out", session.user.username);
    HttpResponse::Ok().json(serde_json::json!({
        "message": text(TextKey::LoggedOut, session.context.language),
    }))
}

#[derive(Deserialize)]
struct PredictRequest {
    #[serde(flatten)]
    request: AssessmentRequest,
    #[serde(default)]
    save: bool,
}

#[derive(Serialize)]
struct PredictResponse {
    #[serde(flatten)]
    assessment: Assessment,
    saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    save_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

async fn predict(
    session: Session,
    body: web::Json<PredictRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let PredictRequest { request, save } = body.into_inner();
    let assessment = assess(&session.context, &state.model, request)?;

    let mut response = PredictResponse {
        assessment,
        saved: false,
        save_error: None,
        message: None,
    };
    if save {
        match state.predictions.append(&response.assessment.result) {
            Ok(_) => {
                response.saved = true;
                response.message = Some(text(TextKey::PredictionSaved, session.context.language));
            }
            Err(e) => {
                warn!("Prediction could not be saved: {e}");
                response.save_error = Some(e.to_string());
            }
        }
    }

    Ok(HttpResponse::Ok().json(response))
}

async fn list_predictions(_session: Session, state: web::Data<AppState>) -> HttpResponse {
    let mut records = state.predictions.load_all();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    HttpResponse::Ok().json(records)
}

async fn dashboard_stats(_session: Session, state: web::Data<AppState>) -> HttpResponse {
    let records = state.predictions.load_all();
    HttpResponse::Ok().json(dashboard::compute(&records, Utc::now()))
}

async fn student_history(
    _session: Session,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let records = state.predictions.load_all();
    HttpResponse::Ok().json(dashboard::student_history(&records, &name))
}

async fn batch_download(
    _session: Session,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let outcome = batch::process(&body[..], &state.model)?;
    let file_name = batch::output_file_name(Utc::now().date_naive());
    let csv = outcome.to_csv_bytes()?;

    let mut response = HttpResponse::Ok();
    response.content_type("text/csv").insert_header((
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{file_name}\""),
    ));
    let failed = outcome.failed_rows();
    if !failed.is_empty() {
        warn!("Batch download: {} row(s) could not be scored", failed.len());
        let rows: Vec<String> = failed.iter().map(ToString::to_string).collect();
        response.insert_header((FAILED_ROWS_HEADER, rows.join(",")));
    }
    Ok(response.body(csv))
}

/// Lists the 1-based row numbers that carry an error instead of a score.
pub const FAILED_ROWS_HEADER: &str = "X-Batch-Failed-Rows";

#[derive(Serialize)]
struct BatchReport {
    summary: batch::BatchSummary,
    errors: Vec<batch::RowError>,
}

async fn batch_summary(
    _session: Session,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let outcome = batch::process(&body[..], &state.model)?;
    Ok(HttpResponse::Ok().json(BatchReport {
        summary: outcome.summary(),
        errors: outcome.errors,
    }))
}

async fn recommendations(
    session: Session,
    tier: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tier: RiskTier = tier
        .parse()
        .map_err(|e: crate::risk::UnknownTier| ApiError::BadRequest(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tier": tier,
        "label": tier.localized(session.context.language),
        "recommendations": recommend(tier),
    })))
}

async fn model_info(_session: Session, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.model.info())
}

async fn add_observation(
    session: Session,
    body: web::Json<ObservationEntry>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let observation = body.into_inner().into_observation(now.date_naive(), now)?;
    observations::record(&state.observations, &observation)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": text(TextKey::ObservationSaved, session.context.language),
        "observation": observation,
    })))
}

const ALL_DATES: DateRange = DateRange {
    start: NaiveDate::MIN,
    end: NaiveDate::MAX,
};

#[derive(Deserialize)]
struct ChildQuery {
    child: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

async fn list_observations(
    _session: Session,
    query: web::Query<ChildQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let end = query.end.unwrap_or_else(|| Utc::now().date_naive());
    let range = match query.start {
        Some(start) => DateRange { start, end },
        None => DateRange::last_30_days(end),
    };
    let all = state.observations.load_all();
    HttpResponse::Ok().json(observations::for_child(&all, &query.child, range))
}

async fn observation_log(
    _session: Session,
    query: web::Query<ChildQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let all = state.observations.load_all();
    HttpResponse::Ok().json(observations::log_for_child(&all, &query.child))
}

async fn weekly_observations(
    _session: Session,
    query: web::Query<ChildQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let all = state.observations.load_all();
    let selected = observations::for_child(&all, &query.child, ALL_DATES);
    HttpResponse::Ok().json(observations::weekly_summary(&selected))
}

async fn observation_insights(
    session: Session,
    query: web::Query<ChildQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let all = state.observations.load_all();
    let selected = observations::for_child(&all, &query.child, ALL_DATES);
    let weeks = observations::weekly_summary(&selected);
    let language = session.context.language;

    let body = observations::weekly_insights(&weeks).map(|insights| {
        serde_json::json!({
            "week_start": insights.week_start,
            "homework": {
                "level": insights.homework,
                "message": text(insights.homework.text_key(), language),
            },
            "behavior": {
                "level": insights.behavior,
                "message": text(insights.behavior.text_key(), language),
            },
            "improvements": insights
                .improvements
                .iter()
                .map(|gain| serde_json::json!({
                    "area": gain,
                    "message": text(gain.text_key(), language),
                }))
                .collect::<Vec<_>>(),
        })
    });
    HttpResponse::Ok().json(body)
}

async fn export_observations(
    _session: Session,
    query: web::Query<ChildQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let all = state.observations.load_all();
    let selected = observations::for_child(&all, &query.child, ALL_DATES);

    let body = observations::export_csv(&selected)
        .map_err(|e| ApiError::Internal(format!("failed to build export: {e}")))?;
    let file_name = observations::export_file_name(&query.child, Utc::now().date_naive());

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(body))
}

#[derive(Deserialize)]
struct ActivityQuery {
    area: String,
    grade: String,
}

async fn classroom_activity(
    session: Session,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, ApiError> {
    if session.user.role == Role::Parent {
        return Err(ApiError::Forbidden(
            "Classroom resources are available to teachers and administrators".to_string(),
        ));
    }
    let area: DifficultyArea = query
        .area
        .parse()
        .map_err(|e: UnknownArea| ApiError::BadRequest(e.to_string()))?;

    let suggestion = resources::generate_activity(area, &query.grade, &mut rand::thread_rng());
    Ok(HttpResponse::Ok().json(suggestion))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("EduScan API is running!")
}

const PAGE_TEXT: &[(&str, TextKey)] = &[
    ("{{app_title}}", TextKey::AppTitle),
    ("{{welcome}}", TextKey::Welcome),
    ("{{low}}", TextKey::LowRisk),
    ("{{medium}}", TextKey::MediumRisk),
    ("{{high}}", TextKey::HighRisk),
    ("{{sign_in}}", TextKey::SignIn),
    ("{{username}}", TextKey::Username),
    ("{{password}}", TextKey::Password),
    ("{{student_assessment}}", TextKey::StudentAssessment),
    ("{{student_name}}", TextKey::StudentName),
    ("{{grade_level}}", TextKey::GradeLevel),
    ("{{math_score}}", TextKey::MathScore),
    ("{{reading_score}}", TextKey::ReadingScore),
    ("{{writing_score}}", TextKey::WritingScore),
    ("{{attendance}}", TextKey::Attendance),
    ("{{behavior_rating}}", TextKey::BehaviorRating),
    ("{{literacy_level}}", TextKey::LiteracyLevel),
    ("{{save_assessment}}", TextKey::SaveAssessment),
    ("{{assess_risk}}", TextKey::AssessRisk),
    ("{{batch_assessment}}", TextKey::BatchAssessment),
    ("{{batch_instructions}}", TextKey::BatchInstructions),
    ("{{summarize_batch}}", TextKey::SummarizeBatch),
    ("{{dashboard}}", TextKey::Dashboard),
    ("{{model_info}}", TextKey::ModelInfo),
    ("{{classroom_activity}}", TextKey::ClassroomActivity),
    ("{{suggest_activity}}", TextKey::SuggestActivity),
];

fn render_homepage(language: Language) -> String {
    PAGE_TEXT
        .iter()
        .fold(HOMEPAGE.to_string(), |page, (placeholder, key)| {
            page.replace(placeholder, text(*key, language))
        })
}

async fn serve_homepage(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_homepage(request_language(&req)))
}

/// Route table, shared by the server and the in-process tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(serve_homepage))
    .route("/health", web::get().to(health_check))
    .route("/login", web::post().to(login))
    .route("/logout", web::post().to(logout))
    .route("/predict", web::post().to(predict))
    .route("/predictions", web::get().to(list_predictions))
    .route("/dashboard", web::get().to(dashboard_stats))
    .route("/students/{name}/history", web::get().to(student_history))
    .route("/batch", web::post().to(batch_download))
    .route("/batch/summary", web::post().to(batch_summary))
    .route("/recommendations/{tier}", web::get().to(recommendations))
    .route("/model/info", web::get().to(model_info))
    .route("/observations", web::post().to(add_observation))
    .route("/observations", web::get().to(list_observations))
    .route("/observations/log", web::get().to(observation_log))
    .route("/observations/weekly", web::get().to(weekly_observations))
    .route("/observations/insights", web::get().to(observation_insights))
    .route("/observations/export", web::get().to(export_observations))
    .route("/resources/activity", web::get().to(classroom_activity));
}

pub async fn start_api(config: AppConfig) -> anyhow::Result<()> {
    let state = web::Data::new(build_state(&config)?);
    if let RiskModelAdapter::Sample = state.model {
        warn!("Serving sample predictions until a model artifact is available");
    }
    let source = state.model.source();
    let (host, port) = config.bind_addr();

    info!("EduScan API starting on http://{host}:{port} (model: {source:?})");
    info!("Data directory: {}", config.data_dir.display());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}

const HOMEPAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{app_title}}</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 860px; margin: 40px auto; padding: 20px; }
        .container { background: #f5f5f5; padding: 25px; border-radius: 10px; }
        .form-group { margin: 12px 0; }
        label { display: block; margin-bottom: 5px; font-weight: bold; }
        input, textarea, select { width: 100%; padding: 10px; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }
        button { background: #007bff; color: white; padding: 12px 24px; border: none; border-radius: 4px; cursor: pointer; margin: 5px; }
        button:hover { background: #0056b3; }
        .result { margin-top: 20px; padding: 20px; border-radius: 5px; display: none; }
        pre.result { white-space: pre-wrap; }
        .low { background: #d4edda; color: #155724; }
        .medium { background: #fff3cd; color: #856404; }
        .high { background: #f8d7da; color: #721c24; }
        .info { background: #d1ecf1; color: #0c5460; }
        .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 0 20px; }
        .feature-section { background: #e8f5e8; padding: 20px; border-radius: 10px; margin: 20px 0; }
    </style>
</head>
<body>
    <div class="container">
        <h1>{{app_title}}</h1>
        <p>{{welcome}}</p>
        <p><span class="low">{{low}}</span> &middot; <span class="medium">{{medium}}</span> &middot; <span class="high">{{high}}</span></p>

        <div id="login-section" class="feature-section">
            <h3>{{sign_in}}</h3>
            <div class="grid">
                <div class="form-group"><label for="username">{{username}}</label><input id="username" value="teacher1"></div>
                <div class="form-group"><label for="password">{{password}}</label><input id="password" type="password"></div>
            </div>
            <button onclick="login()">{{sign_in}}</button>
            <span id="login-status"></span>
        </div>

        <h3>{{student_assessment}}</h3>
        <div class="grid">
            <div class="form-group"><label for="student_name">{{student_name}}</label><input id="student_name"></div>
            <div class="form-group"><label for="grade_level">{{grade_level}}</label><input id="grade_level" placeholder="Grade 4"></div>
            <div class="form-group"><label for="math_score">{{math_score}} (0-100)</label><input id="math_score" type="number" value="75"></div>
            <div class="form-group"><label for="reading_score">{{reading_score}} (0-100)</label><input id="reading_score" type="number" value="80"></div>
            <div class="form-group"><label for="writing_score">{{writing_score}} (0-100)</label><input id="writing_score" type="number" value="70"></div>
            <div class="form-group"><label for="attendance">{{attendance}} (%)</label><input id="attendance" type="number" step="0.1" value="85"></div>
            <div class="form-group"><label for="behavior">{{behavior_rating}} (1-5)</label><input id="behavior" type="number" value="3"></div>
            <div class="form-group"><label for="literacy">{{literacy_level}} (1-10)</label><input id="literacy" type="number" value="6"></div>
        </div>
        <label><input type="checkbox" id="save" style="width:auto"> {{save_assessment}}</label><br>
        <button onclick="predict()">{{assess_risk}}</button>
        <div id="result" class="result"></div>

        <div class="feature-section">
            <h3>{{batch_assessment}}</h3>
            <p>{{batch_instructions}}</p>
            <textarea id="batchData" rows="7" style="font-family: monospace;">name,math_score,reading_score,writing_score,attendance,behavior,literacy
Amina,75,80,70,85,3,6
Yusuf,35,40,30,55,1,2</textarea>
            <button onclick="processBatch()" style="background: #28a745;">{{summarize_batch}}</button>
            <div id="batch-result" class="result info"></div>
        </div>

        <div class="feature-section">
            <h3>{{classroom_activity}}</h3>
            <div class="grid">
                <div class="form-group"><select id="area">
                    <option value="reading">reading</option><option value="math">math</option>
                    <option value="writing">writing</option><option value="behavior">behavior</option>
                </select></div>
                <div class="form-group"><input id="activity_grade" value="Grade 4"></div>
            </div>
            <button onclick="suggestActivity()" style="background: #17a2b8;">{{suggest_activity}}</button>
            <div id="activity-result" class="result info"></div>
        </div>

        <button onclick="showDashboard()" style="background: #6f42c1;">{{dashboard}}</button>
        <button onclick="showModelInfo()" style="background: #fd7e14;">{{model_info}}</button>
        <pre id="panel" class="result info"></pre>
    </div>

    <script>
        let token = null;
        const authHeaders = (extra) => Object.assign({'Authorization': 'Bearer ' + token}, extra || {});
        const num = (id) => parseFloat(document.getElementById(id).value);
        const val = (id) => document.getElementById(id).value;
        const HTML_ENTITIES = {'&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'};
        const escapeHtml = (value) => String(value ?? '').replace(/[&<>"']/g, (c) => HTML_ENTITIES[c]);
        const listItems = (items) => (items || []).map(item => `<li>${escapeHtml(item)}</li>`).join('');

        async function login() {
            const response = await fetch('/login', {
                method: 'POST',
                headers: {'Content-Type': 'application/json'},
                body: JSON.stringify({username: val('username'), password: val('password')})
            });
            const data = await response.json();
            const status = document.getElementById('login-status');
            if (response.ok) { token = data.token; status.textContent = data.message; }
            else { status.textContent = data.error; }
        }

        async function predict() {
            const resultDiv = document.getElementById('result');
            const response = await fetch('/predict', {
                method: 'POST',
                headers: authHeaders({'Content-Type': 'application/json'}),
                body: JSON.stringify({
                    student_name: val('student_name'), grade_level: val('grade_level'),
                    math_score: num('math_score'), reading_score: num('reading_score'),
                    writing_score: num('writing_score'), attendance: num('attendance'),
                    behavior: num('behavior'), literacy: num('literacy'),
                    save: document.getElementById('save').checked
                })
            });
            const data = await response.json();
            resultDiv.style.display = 'block';
            if (!response.ok) {
                resultDiv.className = 'result high';
                resultDiv.innerHTML = `<p>${escapeHtml(data.error)}</p><ul>${listItems(data.details)}</ul>`;
                return;
            }
            resultDiv.className = 'result ' + escapeHtml(data.risk_tier);
            const probability = Number(data.result.probability) * 100;
            resultDiv.innerHTML = `
                <h3>${escapeHtml(data.risk_label)}</h3>
                <p><strong>${probability.toFixed(1)}%</strong></p>
                ${data.notice ? `<p><em>${escapeHtml(data.notice)}</em></p>` : ''}
                <ul>${listItems(data.recommendations)}</ul>
                ${data.message ? `<p>${escapeHtml(data.message)}</p>` : ''}
                ${data.save_error ? `<p>${escapeHtml(data.save_error)}</p>` : ''}
            `;
        }

        async function processBatch() {
            const resultDiv = document.getElementById('batch-result');
            const response = await fetch('/batch/summary', {
                method: 'POST', headers: authHeaders({'Content-Type': 'text/csv'}), body: val('batchData')
            });
            const data = await response.json();
            resultDiv.style.display = 'block';
            if (!response.ok) {
                resultDiv.innerHTML = `<p>${escapeHtml(data.error)}</p><ul>${listItems(data.details)}</ul>`;
                return;
            }
            const s = data.summary;
            resultDiv.innerHTML = `<p>${Number(s.processed)} / ${Number(s.total_rows)}:
                {{low}} ${Number(s.low_risk)}, {{medium}} ${Number(s.medium_risk)}, {{high}} ${Number(s.high_risk)}</p>
                ${data.errors.map(e => `<p>#${Number(e.row)}: ${escapeHtml(e.message)}</p>`).join('')}`;
        }

        async function suggestActivity() {
            const resultDiv = document.getElementById('activity-result');
            const query = new URLSearchParams({area: val('area'), grade: val('activity_grade')});
            const response = await fetch('/resources/activity?' + query, {headers: authHeaders()});
            const data = await response.json();
            resultDiv.style.display = 'block';
            resultDiv.textContent = response.ok ? `${data.grade_group}: ${data.activity}` : data.error;
        }

        async function showPanel(path) {
            const panel = document.getElementById('panel');
            const response = await fetch(path, {headers: authHeaders()});
            panel.style.display = 'block';
            panel.textContent = JSON.stringify(await response.json(), null, 2);
        }
        const showDashboard = () => showPanel('/dashboard');
        const showModelInfo = () => showPanel('/model/info');
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn query_language_overrides_header() {
        let req = TestRequest::default()
            .uri("/?lang=so")
            .insert_header((header::ACCEPT_LANGUAGE, "en-US"))
            .to_http_request();
        assert_eq!(request_language(&req), Language::Somali);
    }

    #[test]
    fn header_language_is_used_without_query() {
        let req = TestRequest::default()
            .insert_header((header::ACCEPT_LANGUAGE, "so-SO,so;q=0.9"))
            .to_http_request();
        assert_eq!(request_language(&req), Language::Somali);
    }

    #[test]
    fn homepage_is_fully_localized() {
        for language in [Language::English, Language::Somali] {
            let page = render_homepage(language);
            assert!(!page.contains("{{"), "unrendered placeholder in {language:?}");
            assert!(page.contains(text(TextKey::StudentAssessment, language)));
            assert!(page.contains(text(TextKey::ClassroomActivity, language)));
        }
        assert!(render_homepage(Language::Somali).contains("Qiimeynta ardayga"));
    }

    #[test]
    fn homepage_escapes_server_values() {
        let page = render_homepage(Language::English);
        assert!(page.contains("const escapeHtml"));
        assert!(page.contains("panel.textContent"));
        assert!(!page.contains("${data.error}"));
        assert!(!page.contains("${e.message}"));
        assert!(!page.contains("<li>${d}</li>"));
        assert!(!page.contains("<li>${r}</li>"));
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let req = TestRequest::default().uri("/?lang=fr").to_http_request();
        assert_eq!(request_language(&req), Language::English);
    }
}
