use crate::api::models::{Alert, Keyword, KeywordInput, Sentiment, ServicesOverview, Tweet};
use crate::api::{AlertFilter, TweetFilter};
use crate::auth::{display_name, Session};
use crate::config::Config;
use crate::error::RasadError;
use crate::format::{
    format_date, overall_status, running_label, sentiment_of, service_display_name,
    service_uptime, severity_label, truncate_message,
};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rasad")]
#[command(about = "Admin dashboard for the Rasad social-media monitoring service", long_about = None)]
pub struct Cli {
    /// Path to the config file (defaults to ~/.config/rasad/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend address, overriding the config file
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in; later commands reuse the token only with session.remember_token
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from RASAD_PASSWORD when omitted
        #[arg(short, long, env = "RASAD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Drop the stored token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List collected tweets
    Tweets(TweetArgs),

    /// List alerts
    Alerts(AlertArgs),

    /// Manage tracked keywords
    #[command(subcommand)]
    Keywords(KeywordCommand),

    /// Inspect and control backend services
    #[command(subcommand)]
    Services(ServiceCommand),

    /// Show system settings and the API budget
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Run sentiment and topic analysis on a tweet
    Analyze {
        /// Database id of the tweet
        id: i64,
    },

    /// List the most discussed topics
    Topics {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Args, Debug, Default)]
pub struct TweetArgs {
    /// Free-text search
    #[arg(short, long)]
    pub query: Option<String>,
    /// positive, negative, neutral or mixed
    #[arg(short, long, value_parser = parse_sentiment)]
    pub sentiment: Option<Sentiment>,
    /// Only tweets matching these keywords
    #[arg(short, long)]
    pub keyword: Vec<String>,
    #[arg(long)]
    pub min_importance: Option<f64>,
    #[arg(short, long, default_value_t = 20)]
    pub limit: u32,
}

impl TweetArgs {
    pub fn filter(&self) -> TweetFilter {
        TweetFilter {
            query: self.query.clone(),
            sentiment: self.sentiment,
            keywords: self.keyword.clone(),
            min_importance: self.min_importance,
            limit: Some(self.limit),
            ..TweetFilter::default()
        }
    }
}

fn parse_sentiment(value: &str) -> std::result::Result<Sentiment, String> {
    Sentiment::ALL
        .into_iter()
        .find(|s| s.as_str() == value)
        .ok_or_else(|| format!("unknown sentiment '{}'", value))
}

#[derive(Args, Debug, Default)]
pub struct AlertArgs {
    /// volume_wave or sentiment_shift
    #[arg(short = 't', long)]
    pub alert_type: Option<String>,
    /// high, medium or low
    #[arg(short, long)]
    pub severity: Option<String>,
    #[arg(long, conflicts_with = "read")]
    pub unread: bool,
    #[arg(long)]
    pub read: bool,
    #[arg(short, long, default_value_t = 10)]
    pub limit: u32,
    /// Mark this alert as read instead of listing
    #[arg(long, value_name = "ID")]
    pub mark_read: Option<i64>,
}

impl AlertArgs {
    pub fn filter(&self) -> AlertFilter {
        let is_read = match (self.read, self.unread) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        AlertFilter {
            alert_type: self.alert_type.clone(),
            severity: self.severity.clone(),
            is_read,
            limit: Some(self.limit),
            ..AlertFilter::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum KeywordCommand {
    List {
        /// Only active keywords
        #[arg(long)]
        active: bool,
    },
    Add {
        text: String,
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(1..=10))]
        priority: i32,
        #[arg(short, long)]
        description: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=10))]
        priority: Option<i32>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,
        #[arg(long)]
        deactivate: bool,
    },
    /// Deactivate a keyword
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    Status,
    /// Start a service, or "all"
    Start { name: String },
    /// Stop a service, or "all"
    Stop { name: String },
    Logs {
        name: String,
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    Budget,
    SetBudget { amount: f64 },
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Note printed after a login whose token dies with the process.
fn login_hint(session: &Session) -> Option<&'static str> {
    (!session.keeps_token()).then_some(
        "token is not kept after this command; set session.remember_token = true in the config to reuse it",
    )
}

fn require_login(session: &Session) -> Result<()> {
    if !session.is_logged_in() {
        bail!(RasadError::NotAuthenticated);
    }
    Ok(())
}

/// Run a headless subcommand against the backend.
pub async fn run(command: Commands, session: &Session, config_path: Option<PathBuf>) -> Result<()> {
    let client = session.client();

    match command {
        Commands::InitConfig => init_config(config_path),
        Commands::Login { username, password } => {
            session.login(&username, &password).await?;
            match session.check_session().await {
                Some(user) => println!("به سیستم رصد خوش آمدید، {}", display_name(&user)),
                None => bail!(RasadError::NotAuthenticated),
            }
            if let Some(hint) = login_hint(session) {
                eprintln!("note: {}", hint);
            }
            Ok(())
        }
        Commands::Logout => {
            session.logout();
            println!("با موفقیت از سیستم خارج شدید");
            Ok(())
        }
        Commands::Whoami => {
            require_login(session)?;
            let user = client.me().await?;
            println!("{}", display_name(&user));
            if user.is_superuser {
                println!("مدیر سیستم");
            }
            Ok(())
        }
        Commands::Tweets(args) => {
            require_login(session)?;
            let tweets = client.tweets(&args.filter()).await?;
            if tweets.is_empty() {
                println!("توییتی یافت نشد");
            }
            for tweet in &tweets {
                println!("{}", tweet_line(tweet));
            }
            Ok(())
        }
        Commands::Alerts(args) => {
            require_login(session)?;
            if let Some(id) = args.mark_read {
                client.mark_alert_read(id).await?;
                println!("هشدار {} خوانده شد", id);
                return Ok(());
            }
            let alerts = client.alerts(&args.filter()).await?;
            if alerts.is_empty() {
                println!("هشداری یافت نشد");
            }
            for alert in &alerts {
                println!("{}", alert_line(alert));
            }
            Ok(())
        }
        Commands::Keywords(cmd) => {
            require_login(session)?;
            keywords(session, cmd).await
        }
        Commands::Services(cmd) => {
            require_login(session)?;
            services(session, cmd).await
        }
        Commands::Settings(cmd) => {
            require_login(session)?;
            settings(session, cmd).await
        }
        Commands::Analyze { id } => {
            require_login(session)?;
            let result = client.analyze_tweet(id).await?;
            println!("تحلیل توییت با موفقیت انجام شد");
            println!(
                "احساس: {} ({:.2})",
                sentiment_of(Some(result.sentiment.label)),
                result.sentiment.score
            );
            if let Some(topic) = &result.main_topic {
                println!("موضوع اصلی: {}", topic);
            }
            if !result.keywords.is_empty() {
                println!("کلیدواژه‌ها: {}", result.keywords.join("، "));
            }
            Ok(())
        }
        Commands::Topics { limit } => {
            require_login(session)?;
            for topic in client.topics(limit).await? {
                println!("{:>6}  {}", topic.tweet_count, topic.name);
            }
            Ok(())
        }
    }
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path.or_else(Config::config_path) else {
        bail!("Could not determine a config directory");
    };
    if path.exists() {
        let config = Config::load(Some(&path))?;
        println!("Config: {}", path.display());
        println!("Backend: {}", config.api.base_url);
    } else {
        Config::default().save(&path)?;
        println!("Created default config at {}", path.display());
    }
    Ok(())
}

async fn keywords(session: &Session, cmd: KeywordCommand) -> Result<()> {
    let client = session.client();
    match cmd {
        KeywordCommand::List { active } => {
            for keyword in client.keywords(active).await? {
                println!("{}", keyword_line(&keyword));
            }
        }
        KeywordCommand::Add {
            text,
            priority,
            description,
        } => {
            if text.trim().is_empty() {
                bail!(RasadError::Validation(
                    "لطفاً متن کلیدواژه را وارد کنید".to_string()
                ));
            }
            let input = KeywordInput {
                priority,
                description,
                ..KeywordInput::new(text.trim())
            };
            let keyword = client.create_keyword(&input).await?;
            println!("کلیدواژه با موفقیت افزوده شد: {}", keyword_line(&keyword));
        }
        KeywordCommand::Update {
            id,
            text,
            priority,
            description,
            activate,
            deactivate,
        } => {
            let current = client
                .keywords(false)
                .await?
                .into_iter()
                .find(|k| k.id == id)
                .ok_or_else(|| RasadError::Validation(format!("کلیدواژه {} یافت نشد", id)))?;
            let mut input = KeywordInput::from(&current);
            if let Some(text) = text {
                input.text = text;
            }
            if let Some(priority) = priority {
                input.priority = priority;
            }
            if description.is_some() {
                input.description = description;
            }
            if activate {
                input.is_active = true;
            } else if deactivate {
                input.is_active = false;
            }
            let keyword = client.update_keyword(id, &input).await?;
            println!("{}", keyword_line(&keyword));
        }
        KeywordCommand::Delete { id, yes } => {
            if !yes && !confirm("آیا از حذف این کلیدواژه اطمینان دارید؟")? {
                println!("لغو شد");
                return Ok(());
            }
            client.delete_keyword(id).await?;
            println!("کلیدواژه با موفقیت حذف شد");
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    use std::io::Write;
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn services(session: &Session, cmd: ServiceCommand) -> Result<()> {
    let client = session.client();
    match cmd {
        ServiceCommand::Status => {
            let overview = client.services().await?;
            print!("{}", services_report(&overview));
        }
        ServiceCommand::Start { name } => {
            let action = client.start_service(&name).await?;
            println!("{}: {}", service_display_name(&action.service), action.status);
        }
        ServiceCommand::Stop { name } => {
            let action = client.stop_service(&name).await?;
            println!("{}: {}", service_display_name(&action.service), action.status);
        }
        ServiceCommand::Logs { name, lines } => {
            let logs = client.service_logs(&name, lines).await?;
            for (stream, text) in &logs.logs {
                println!("== {} ==", stream);
                println!("{}", text);
            }
        }
    }
    Ok(())
}

async fn settings(session: &Session, cmd: SettingsCommand) -> Result<()> {
    let client = session.client();
    match cmd {
        SettingsCommand::Show => {
            let settings = client.settings().await?;
            println!("پروژه: {}", settings.project_name);
            println!("مدل: {}", settings.claude_model);
            println!("اندازه دسته تحلیل: {}", settings.analyzer_batch_size);
            println!("بودجه روزانه: ${:.2}", settings.daily_budget);
            println!("آدرس API توییتر: {}", settings.twitter_api_base_url);
            println!("حالت توسعه: {}", if settings.debug { "فعال" } else { "غیرفعال" });
        }
        SettingsCommand::Budget => {
            let budget = client.budget().await?;
            println!(
                "${:.2} از ${:.2} ({:.1}%)",
                budget.total_usage, budget.total_budget, budget.percentage_used
            );
            println!("باقیمانده: ${:.2}", budget.remaining);
            if budget.is_exhausted {
                println!("بودجه تمام شده است");
            }
        }
        SettingsCommand::SetBudget { amount } => {
            let budget = client.update_budget(amount).await?;
            println!("بودجه روزانه: ${:.2}", budget.total_budget);
        }
    }
    Ok(())
}

fn tweet_line(tweet: &Tweet) -> String {
    format!(
        "#{} @{} [{}] {} | {}",
        tweet.id,
        tweet.author(),
        sentiment_of(tweet.sentiment_label),
        format_date(tweet.created_at.as_ref()),
        truncate_message(&tweet.content.replace('\n', " "), 100)
    )
}

fn alert_line(alert: &Alert) -> String {
    format!(
        "#{} [{}]{} {} | {}",
        alert.id,
        severity_label(alert.severity),
        if alert.is_read { "" } else { " *" },
        alert.title,
        format_date(alert.created_at.as_ref())
    )
}

fn keyword_line(keyword: &Keyword) -> String {
    format!(
        "#{} {} (اولویت {}){}",
        keyword.id,
        keyword.text,
        keyword.priority,
        if keyword.is_active { "" } else { " [غیرفعال]" }
    )
}

fn services_report(overview: &ServicesOverview) -> String {
    let mut out = format!(
        "وضعیت کلی: {}\n",
        overall_status(&overview.services).label()
    );
    for (name, status) in &overview.services {
        out.push_str(&format!(
            "{:<24} {:<10} {}\n",
            service_display_name(name),
            running_label(status.is_running()),
            service_uptime(status)
        ));
    }
    out
}
