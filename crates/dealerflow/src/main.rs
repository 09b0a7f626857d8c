//! `dealerflow` - CLI for the dealership vehicle workflow
//!
//! Every subcommand opens the screen it acts on, checks the signed-in role
//! against it, performs one action and reports the screen it lands on.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use dealerflow::auth::{AuthProvider, LocalAuth, Session, SessionManager};
use dealerflow::cli::{
    Cli, Command, ConfigCommand, FormatArgs, InviteCommand, JoinCommand, ListCommand,
    LoginCommand, NewCommand, OutputFormat, RemoveCommand, ShowCommand, SignStepCommand,
    SignupCommand, StageCommand, ToggleCommand, VinCommand,
};
use dealerflow::navigation::{require, Screen};
use dealerflow::registry::{self, NewVehicle};
use dealerflow::storage::{DocumentStore, SqliteStore};
use dealerflow::{checklist, organization, vin};
use dealerflow::{init_logging, CarDetail, Config, Error, Role, Stage, StageForm};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    let result = match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Template(args) => handle_template(&args),
        command => run(&config, command).await,
    };

    if let Err(err) = result {
        // Library errors are shown the way a screen would show them.
        match err.downcast_ref::<Error>() {
            Some(e) => {
                tracing::debug!("{e}");
                eprintln!("{}", e.screen_message());
            }
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let mut app = App::open(config)?;
    app.run(command).await
}

struct App {
    config: Config,
    sqlite: Arc<SqliteStore>,
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
    session_path: PathBuf,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("database", &self.sqlite.path())
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

impl App {
    fn open(config: &Config) -> anyhow::Result<Self> {
        let sqlite = Arc::new(SqliteStore::open(config.database_path())?);
        let store: Arc<dyn DocumentStore> = sqlite.clone();
        let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuth::new(store.clone()));
        let mut sessions =
            SessionManager::new(store.clone(), auth, &config.auth.superuser_emails);

        let session_path = config.session_path();
        if let Some(session) = Session::load(&session_path)
            .with_context(|| format!("reading session from {}", session_path.display()))?
        {
            sessions.restore(session);
        }

        Ok(Self {
            config: config.clone(),
            sqlite,
            store,
            sessions,
            session_path,
        })
    }

    async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Login(cmd) => self.login(cmd).await,
            Command::Logout => self.logout(),
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Signup(cmd) => self.signup(cmd).await,
            Command::Join(cmd) => self.join(cmd).await,
            Command::Invite(cmd) => self.invite(cmd).await,
            Command::New(cmd) => self.new_process(cmd).await,
            Command::List(cmd) => self.list(&cmd).await,
            Command::Show(cmd) => self.show(&cmd).await,
            Command::Toggle(cmd) => self.toggle(&cmd).await,
            Command::SignStep(cmd) => self.sign_step(cmd).await,
            Command::Stage(cmd) => self.stage(cmd).await,
            Command::Remove(cmd) => self.remove(&cmd).await,
            Command::Vin(cmd) => self.vin(&cmd).await,
            Command::Status(args) => self.status(&args),
            Command::Template(args) => handle_template(&args),
            Command::Config(cmd) => handle_config(&self.config, cmd),
        }
    }

    fn session(&self) -> anyhow::Result<&Session> {
        match self.sessions.current() {
            Some(session) => Ok(session),
            None => bail!("Not signed in. Run `dealerflow login <email>` first."),
        }
    }

    fn open_screen(&self, screen: &Screen) -> anyhow::Result<()> {
        self.session()?;
        require(self.sessions.role(), screen)?;
        Ok(())
    }

    fn persist_session(&self) -> anyhow::Result<()> {
        if let Some(session) = self.sessions.current() {
            session.save(&self.session_path)?;
        }
        Ok(())
    }

    async fn login(&mut self, cmd: LoginCommand) -> anyhow::Result<()> {
        let screen = self.sessions.sign_in(&cmd.email, &cmd.password).await?;
        self.persist_session()?;
        self.whoami();
        print_screen(&screen);
        Ok(())
    }

    fn logout(&mut self) -> anyhow::Result<()> {
        let screen = self.sessions.sign_out();
        Session::clear(&self.session_path)?;
        println!("Signed out.");
        print_screen(&screen);
        Ok(())
    }

    fn whoami(&self) {
        match self.sessions.current() {
            Some(session) => println!("{} ({})", session.user.email, session.role),
            None => println!("Not signed in."),
        }
    }

    async fn signup(&mut self, cmd: SignupCommand) -> anyhow::Result<()> {
        let screen =
            organization::sign_up_admin(&mut self.sessions, &cmd.email, &cmd.password, &cmd.organization)
                .await?;
        self.persist_session()?;
        println!("Created organization '{}'.", cmd.organization.trim());
        self.whoami();
        print_screen(&screen);
        Ok(())
    }

    async fn join(&mut self, cmd: JoinCommand) -> anyhow::Result<()> {
        let screen =
            organization::sign_up_employee(&mut self.sessions, &cmd.email, &cmd.password, &cmd.code)
                .await?;
        self.persist_session()?;
        self.whoami();
        print_screen(&screen);
        Ok(())
    }

    async fn invite(&self, cmd: InviteCommand) -> anyhow::Result<()> {
        self.open_screen(&Screen::AdminDashboard)?;
        let invitation = organization::invite(
            self.store.as_ref(),
            self.session()?,
            &cmd.email,
            Role::from(cmd.role),
            self.config.auth.invite_code_length,
        )
        .await?;
        println!(
            "Invitation code for {} ({}): {}",
            cmd.email.trim(),
            invitation.role,
            invitation.invite_code
        );
        Ok(())
    }

    async fn new_process(&self, cmd: NewCommand) -> anyhow::Result<()> {
        self.open_screen(&Screen::NewCarProcess)?;
        let screen = registry::start_process(
            self.store.as_ref(),
            NewVehicle {
                vehicle_name: cmd.name,
                stock_number: cmd.stock,
                vin: cmd.vin,
            },
        )
        .await?;
        if let Some(car_id) = screen.car_id() {
            println!("Started vehicle process {car_id}");
        }
        print_screen(&screen);
        Ok(())
    }

    async fn list(&self, cmd: &ListCommand) -> anyhow::Result<()> {
        self.open_screen(&Screen::FindCar)?;
        let vehicles = registry::list_vehicles(self.store.as_ref()).await?;

        match cmd.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&vehicles)?),
            OutputFormat::Table => {
                println!("{:<34} {:<30} {}", "ID", "VEHICLE", "STOCK");
                for v in &vehicles {
                    println!("{:<34} {:<30} {}", v.id, v.vehicle_name, v.stock_number);
                }
                println!();
                println!("{} vehicle(s)", vehicles.len());
            }
            OutputFormat::Plain => {
                for v in &vehicles {
                    println!("{}\t{}\t{}", v.id, v.vehicle_name, v.stock_number);
                }
            }
        }
        Ok(())
    }

    async fn load_detail(&self, car_id: &str) -> anyhow::Result<CarDetail> {
        self.open_screen(&Screen::CarDetail {
            car_id: car_id.to_string(),
        })?;
        let mut detail = CarDetail::new(car_id);
        detail.load(self.store.as_ref()).await?;
        Ok(detail)
    }

    async fn show(&self, cmd: &ShowCommand) -> anyhow::Result<()> {
        let detail = self.load_detail(&cmd.car_id).await?;
        let record = detail.merged()?;

        if cmd.format == OutputFormat::Json {
            let mut body = record.to_document()?;
            body["id"] = serde_json::Value::from(detail.car_id());
            println!("{}", serde_json::to_string_pretty(&body)?);
            return Ok(());
        }

        println!("{} [{}]", record.vehicle_name, detail.car_id());
        println!("  Stock Number: {}", record.stock_number);
        if let Some(vin) = &record.vin {
            println!("  VIN:          {vin}");
        }
        for stage in Stage::ALL {
            for field in stage.fields() {
                let value = record.field(*field);
                if !value.is_empty() {
                    println!("  {}: {value}", field.label());
                }
            }
        }

        for (i, step) in detail.steps().iter().enumerate() {
            println!();
            println!(
                "{i}. {} ({}/{})",
                step.title,
                step.checked_count(),
                step.tasks.len()
            );
            for (j, task) in step.tasks.iter().enumerate() {
                let mark = if task.checked { "x" } else { " " };
                println!("   [{mark}] {i}.{j} {}", task.label);
            }
            if !step.initials.is_empty() || !step.date.is_empty() {
                println!("   Initials: {}  Date: {}", step.initials, step.date);
            }
        }
        Ok(())
    }

    async fn toggle(&self, cmd: &ToggleCommand) -> anyhow::Result<()> {
        let mut detail = self.load_detail(&cmd.car_id).await?;
        let checked = detail.toggle(cmd.step, cmd.task)?;
        let screen = detail.save(self.store.as_ref()).await?;

        if let Some(task) = detail.step(cmd.step)?.tasks.get(cmd.task) {
            println!("[{}] {}", if checked { "x" } else { " " }, task.label);
        }
        print_screen(&screen);
        Ok(())
    }

    async fn sign_step(&self, cmd: SignStepCommand) -> anyhow::Result<()> {
        let mut detail = self.load_detail(&cmd.car_id).await?;
        // Reject a bad step before anything can be written.
        detail.step(cmd.step)?;
        if let Some(initials) = cmd.initials {
            detail.set_initials(cmd.step, initials)?;
        }
        let date = if cmd.today {
            Some(chrono::Local::now().format("%Y-%m-%d").to_string())
        } else {
            cmd.date
        };
        if let Some(date) = date {
            detail.set_date(cmd.step, date)?;
        }
        let screen = detail.save(self.store.as_ref()).await?;

        let step = detail.step(cmd.step)?;
        println!(
            "{}: initials '{}', date '{}'",
            step.title, step.initials, step.date
        );
        print_screen(&screen);
        Ok(())
    }

    async fn stage(&self, cmd: StageCommand) -> anyhow::Result<()> {
        self.open_screen(&cmd.stage.screen(&cmd.car_id))?;
        let mut form = StageForm::load(self.store.as_ref(), cmd.stage, &cmd.car_id).await?;

        if cmd.assignments.is_empty() {
            for (field, value) in form.values() {
                println!("{:<20} {value}", format!("{}:", field.label()));
            }
            return Ok(());
        }

        for (field, value) in cmd.assignments {
            form.set(field, value)?;
        }
        let screen = form.save(self.store.as_ref()).await?;
        println!("Saved {} form.", form.stage());
        print_screen(&screen);
        Ok(())
    }

    async fn remove(&self, cmd: &RemoveCommand) -> anyhow::Result<()> {
        self.open_screen(&Screen::FindCar)?;
        if !cmd.yes {
            println!("This will permanently remove vehicle {}.", cmd.car_id);
            println!("Use --yes to confirm.");
            return Ok(());
        }
        registry::remove_vehicle(self.store.as_ref(), self.session()?, &cmd.car_id).await?;
        println!("Removed vehicle {}", cmd.car_id);
        Ok(())
    }

    async fn vin(&self, cmd: &VinCommand) -> anyhow::Result<()> {
        self.open_screen(&Screen::BarcodeScanner)?;
        let normalized = match &cmd.car {
            Some(car_id) => registry::assign_vin(self.store.as_ref(), car_id, &cmd.vin).await?,
            None => vin::normalize(&cmd.vin)?,
        };
        println!("{normalized}");
        if !vin::looks_valid(&normalized) {
            eprintln!("Note: {normalized} is not a standard 17-character VIN.");
        }
        Ok(())
    }

    fn status(&self, args: &FormatArgs) -> anyhow::Result<()> {
        let stats = self.sqlite.stats()?;
        let signed_in = self.sessions.current().map(|s| s.user.email.clone());

        if args.json {
            let collections: serde_json::Map<String, serde_json::Value> = stats
                .collections
                .iter()
                .map(|(name, count)| (name.clone(), serde_json::Value::from(*count)))
                .collect();
            let status = serde_json::json!({
                "database_path": self.sqlite.path(),
                "database_size_bytes": stats.db_size_bytes,
                "collections": collections,
                "signed_in": signed_in,
                "role": self.sessions.role().as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("dealerflow status");
            println!("-----------------");
            println!("Database:      {}", self.sqlite.path().display());
            println!("Size:          {} bytes", stats.db_size_bytes);
            println!("Vehicles:      {}", stats.count(dealerflow::vehicle::CARS));
            println!("Users:         {}", stats.count(dealerflow::auth::USERS));
            println!(
                "Organizations: {}",
                stats.count(organization::ORGANIZATIONS)
            );
            println!(
                "Signed in:     {}",
                signed_in.as_deref().unwrap_or("(nobody)")
            );
        }
        Ok(())
    }
}

fn print_screen(screen: &Screen) {
    println!("-> {screen}");
}

fn handle_template(args: &FormatArgs) -> anyhow::Result<()> {
    let steps = checklist::template();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    for (i, step) in steps.iter().enumerate() {
        println!("{i}. {}", step.title);
        for (j, task) in step.tasks.iter().enumerate() {
            println!("   {i}.{j} {}", task.label);
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Store]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Auth]");
                println!(
                    "  Superusers:         {}",
                    config.auth.superuser_emails.join(", ")
                );
                println!(
                    "  Invite code length: {}",
                    config.auth.invite_code_length
                );
                println!();
                println!("[Session]");
                println!("  Session path:       {}", config.session_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
