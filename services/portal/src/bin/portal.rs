//! services/portal/src/bin/portal.rs

use portal_lib::{
    app::{gate, landing_route, AdminView, AppState, CustomerView, ResolveState, Route, ViewError},
    config::Config,
    error::PortalError,
};
use std::io::Write;
use support_portal_core::domain::{
    Complaint, ComplaintId, Credentials, Registration, StatusFilter, COMPLAINT_CATEGORIES,
    DEFAULT_CATEGORY,
};
use support_portal_core::lifecycle::LifecycleError;
use support_portal_core::messages;
use support_portal_core::ports::PortError;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  register              create a customer account
  login                 sign in
  logout                sign out
  whoami                show the signed-in account
  list [status]         list complaints (admins may filter: pending, in-progress, resolved)
  show <id>             show one complaint
  new                   file a complaint
  start <id>            mark a complaint In Progress (admin)
  resolve <id>          resolve a complaint with an AI-suggested draft (admin)
  help                  show this text
  quit                  exit";

#[tokio::main]
async fn main() -> Result<(), PortalError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting portal...");

    // --- 2. Build the Shared AppState (restores any saved session) ---
    let state = AppState::from_config(config)?;

    // --- 3. Run the Console ---
    let mut console = Console {
        state,
        lines: BufReader::new(tokio::io::stdin()).lines(),
    };
    console.run().await
}

struct Console {
    state: AppState,
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    async fn run(&mut self) -> Result<(), PortalError> {
        println!("Support portal ({})", self.state.config.api_base_url);
        self.show_landing();
        println!("Type 'help' for commands.");

        loop {
            let Some(line) = self.prompt("portal> ").await? else {
                break;
            };
            let mut words = line.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            let arg = words.next();

            match command {
                "help" => println!("{}", HELP),
                "quit" | "exit" => break,
                "register" => self.register().await?,
                "login" => self.login().await?,
                "logout" => {
                    self.state.session.sign_out();
                    self.show_landing();
                }
                "whoami" => match self.state.session.current_identity() {
                    Some(identity) => println!(
                        "{} <{}> ({})",
                        identity.display_name,
                        identity.email,
                        identity.role.as_str()
                    ),
                    None => println!("Not signed in."),
                },
                "list" => self.list(arg).await,
                "show" => {
                    if let Some(id) = parse_id(arg) {
                        self.show(id).await;
                    }
                }
                "new" => self.file_complaint().await?,
                "start" => {
                    if let Some(id) = parse_id(arg) {
                        self.start(id).await;
                    }
                }
                "resolve" => {
                    if let Some(id) = parse_id(arg) {
                        self.resolve(id).await?;
                    }
                }
                other => println!("Unknown command '{}'. Type 'help' for commands.", other),
            }
        }

        info!("Console closed.");
        Ok(())
    }

    /// Reads one trimmed line. `None` once stdin is closed.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>, PortalError> {
        print!("{}", label);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }

    async fn prompt_or_empty(&mut self, label: &str) -> Result<String, PortalError> {
        Ok(self.prompt(label).await?.unwrap_or_default())
    }

    fn show_landing(&self) {
        let identity = self.state.session.current_identity();
        match &identity {
            Some(identity) => println!("Signed in as {}.", identity.display_name),
            None => println!("Not signed in. Use 'login' or 'register'."),
        }
        println!("-> {}", landing_route(identity.as_deref()));
    }

    /// Prints where the user is sent instead, if `route` is off-limits.
    fn allowed(&self, route: Route) -> bool {
        let identity = self.state.session.current_identity();
        let target = gate(route, identity.as_deref());
        if target != route {
            println!("Not available here. -> {}", target);
            return false;
        }
        true
    }

    async fn register(&mut self) -> Result<(), PortalError> {
        let registration = Registration {
            full_name: self.prompt_or_empty("Full name: ").await?,
            email: self.prompt_or_empty("Email: ").await?,
            password: self.prompt_or_empty("Password: ").await?,
            password_confirmation: self.prompt_or_empty("Confirm password: ").await?,
        };
        match self.state.session.register(&registration).await {
            Ok(_) => println!("Registration successful. Please log in."),
            Err(e) => println!("{}", messages::registration_message(&e)),
        }
        Ok(())
    }

    async fn login(&mut self) -> Result<(), PortalError> {
        let credentials = Credentials {
            email: self.prompt_or_empty("Email: ").await?,
            password: self.prompt_or_empty("Password: ").await?,
        };
        match self.state.session.sign_in(&credentials).await {
            Ok(_) => self.show_landing(),
            Err(e) => println!("{}", messages::login_message(&e)),
        }
        Ok(())
    }

    async fn list(&self, filter: Option<&str>) {
        let identity = self.state.session.current_identity();
        let result = match identity.as_ref().map(|i| i.is_admin()) {
            None => {
                self.allowed(Route::CustomerDashboard);
                return;
            }
            Some(true) => {
                let filter = match filter.map(str::parse::<StatusFilter>).transpose() {
                    Ok(filter) => filter.unwrap_or_default(),
                    Err(e) => {
                        println!("{}", e);
                        return;
                    }
                };
                match AdminView::open(&self.state) {
                    Ok(view) => view.dashboard(filter).await,
                    Err(e) => Err(e),
                }
            }
            Some(false) => match CustomerView::open(&self.state) {
                Ok(view) => view.dashboard().await,
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(dashboard) => {
                let stats = dashboard.stats;
                println!(
                    "Total: {}  Pending: {}  Resolved: {}",
                    stats.total, stats.pending, stats.resolved
                );
                if dashboard.complaints.is_empty() {
                    println!("No complaints.");
                }
                for complaint in &dashboard.complaints {
                    print_row(complaint);
                }
            }
            Err(e) => report(&e),
        }
    }

    async fn show(&self, id: ComplaintId) {
        let is_admin = self
            .state
            .session
            .current_identity()
            .is_some_and(|i| i.is_admin());
        let result = if is_admin {
            match AdminView::open(&self.state) {
                Ok(view) => view.complaint(id).await,
                Err(e) => Err(e),
            }
        } else if self.allowed(Route::ComplaintDetails(id)) {
            match CustomerView::open(&self.state) {
                Ok(view) => view.complaint(id).await,
                Err(e) => Err(e),
            }
        } else {
            return;
        };

        match result {
            Ok(complaint) => print_details(&complaint),
            Err(
                ViewError::Port(PortError::NotFound(_))
                | ViewError::Lifecycle(LifecycleError::Port(PortError::NotFound(_))),
            ) => println!("{}", messages::COMPLAINT_NOT_FOUND),
            Err(e @ (ViewError::Port(_) | ViewError::Lifecycle(_))) => {
                warn!("Failed to load complaint {}: {}", id, e);
                println!("{}", messages::COMPLAINT_LOAD_FAILED);
            }
            Err(e) => report(&e),
        }
    }

    async fn file_complaint(&mut self) -> Result<(), PortalError> {
        if !self.allowed(Route::NewComplaint) {
            return Ok(());
        }
        let view = match CustomerView::open(&self.state) {
            Ok(view) => view,
            Err(e) => {
                report(&e);
                return Ok(());
            }
        };

        let title = self.prompt_or_empty("Title: ").await?;
        let label = format!(
            "Category [{}] (default {}): ",
            COMPLAINT_CATEGORIES.join(", "),
            DEFAULT_CATEGORY
        );
        let category = self.prompt_or_empty(&label).await?;
        let category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category
        };
        let description = self.prompt_or_empty("Description: ").await?;

        match view.file_complaint(&title, &category, &description).await {
            Ok(complaint) => {
                println!("Complaint {} submitted.", complaint.id);
                print_details(&complaint);
            }
            Err(e) => report(&e),
        }
        Ok(())
    }

    async fn start(&self, id: ComplaintId) {
        if !self.allowed(Route::AdminDashboard) {
            return;
        }
        let result = match AdminView::open(&self.state) {
            Ok(view) => view.begin_work(id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(complaint) => println!("Complaint {} is now {}.", complaint.id, complaint.status),
            Err(e) => report(&e),
        }
    }

    async fn resolve(&mut self, id: ComplaintId) -> Result<(), PortalError> {
        if !self.allowed(Route::AdminResolve(id)) {
            return Ok(());
        }
        let view = match AdminView::open(&self.state) {
            Ok(view) => view,
            Err(e) => {
                report(&e);
                return Ok(());
            }
        };
        let mut screen = view.resolve_screen(id);
        println!(
            "Loading complaint {} and its suggested resolution...",
            screen.id()
        );
        if let Err(e) = screen.load().await {
            report(&e);
            return Ok(());
        }

        if let ResolveState::LoadFailed(message) = screen.state() {
            println!("{}", message);
            return Ok(());
        }
        if let Some(draft) = screen.draft() {
            print_details(draft.complaint());
            if let Some(prior) = draft.prior_resolution() {
                println!("Current resolution:\n  {}", prior);
            }
            match draft.suggestion() {
                Some(suggestion) => println!("Suggested resolution:\n  {}", suggestion),
                None => println!("{}", messages::NO_SUGGESTION),
            }
            println!("{} (empty line keeps the text above):", draft.field_label());
        }

        let edited = self.prompt_or_empty("> ").await?;
        if !edited.is_empty() {
            screen.edit(edited);
        }

        loop {
            match screen.commit().await {
                Ok(complaint) => {
                    println!("Complaint {} is {}.", screen.id(), complaint.status);
                    break;
                }
                Err(ViewError::Unmounted) => break,
                Err(e) => {
                    warn!("Commit for complaint {} failed: {}", id, e);
                    if let ResolveState::Ready {
                        error: Some(message),
                        ..
                    } = screen.state()
                    {
                        println!("{}", message);
                    }
                    let retry = self.prompt_or_empty("Retry? [y/N] ").await?;
                    if !retry.eq_ignore_ascii_case("y") {
                        break;
                    }
                }
            }
        }
        screen.unmount();
        Ok(())
    }
}

fn parse_id(arg: Option<&str>) -> Option<ComplaintId> {
    match arg.map(str::parse::<ComplaintId>) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) | None => {
            println!("Expected a complaint id, e.g. 'show 12'.");
            None
        }
    }
}

fn report(error: &ViewError) {
    println!("{}", error.user_message());
}

fn print_row(complaint: &Complaint) {
    let severity = complaint
        .ai_severity_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let marker = if complaint.awaiting_resolution() { "*" } else { " " };
    println!(
        "{}#{:<5} {:<12} {:<9} {:<6} {}",
        marker,
        complaint.id.0,
        complaint.status.as_str(),
        complaint.category,
        severity,
        complaint.title
    );
}

fn print_details(complaint: &Complaint) {
    println!("Complaint {}: {}", complaint.id, complaint.title);
    if let Some(owner) = &complaint.owner_name {
        println!("  Filed by:  {}", owner);
    }
    println!("  Category:  {}", complaint.category);
    println!("  Status:    {}", complaint.status);
    if let Some(priority) = complaint.priority {
        println!("  Priority:  {}", priority.as_str());
    }
    if let Some(score) = complaint.ai_severity_score {
        println!("  Severity:  {} ({})", score, score.band().as_str());
    }
    if let Some(eta) = &complaint.ai_predicted_resolution_time {
        println!("  ETA:       {}", eta);
    }
    println!("  Filed:     {}", complaint.created_at.format("%Y-%m-%d %H:%M"));
    println!("  {}", complaint.description);
    match complaint.resolution_text() {
        Some(resolution) => println!("  Resolution: {}", resolution),
        None if complaint.awaiting_resolution() => println!("  Awaiting resolution."),
        None => {}
    }
}
