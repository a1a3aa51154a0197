//! Launchable application model and the interactive launch menu.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use trajlab_proc::CommandSpec;

use crate::prompt::{Prompter, Question};

/// The fixed set of end-user applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationId {
    WebSimulator,
    Dashboard,
    DesktopGui,
}

impl ApplicationId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationId::WebSimulator => "web-simulator",
            ApplicationId::Dashboard => "dashboard",
            ApplicationId::DesktopGui => "desktop-gui",
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an application is meant to hold the terminal or run in the
/// background. Every shipped application is `Detached`; launches are always
/// fire-and-forget, and the mode only informs display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    Foreground,
    Detached,
}

/// A launchable end-user application. The advertised port is informational
/// only; nothing binds or probes it.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: ApplicationId,
    pub display_name: String,
    pub entrypoint: CommandSpec,
    pub mode: LaunchMode,
    pub port: Option<u16>,
}

/// Operator's choice at the launch menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    One(ApplicationId),
    All,
    Skip,
}

/// Presents the enumerated application list plus "launch all" and "skip".
///
/// Any input outside the valid ordinal range degrades to [`MenuSelection::Skip`]
/// with a warning; the menu never crashes and never re-prompts.
pub struct LaunchMenu {
    prompter: Arc<dyn Prompter>,
}

impl LaunchMenu {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    pub async fn present(&self, apps: &[Application]) -> MenuSelection {
        let mut choices: Vec<String> = apps
            .iter()
            .map(|app| match app.port {
                Some(port) => format!("{} (port {})", app.display_name, port),
                None => app.display_name.clone(),
            })
            .collect();
        choices.push("All Applications".into());
        choices.push("Skip application launch".into());
        let total = choices.len();

        let question = Question {
            prompt: format!("Select application to launch (1-{})", total),
            choices,
        };

        let answer = match self.prompter.ask(&question).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "could not read menu selection, skipping launch");
                return MenuSelection::Skip;
            }
        };

        match answer.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= apps.len() => MenuSelection::One(apps[n - 1].id),
            Ok(n) if n == apps.len() + 1 => MenuSelection::All,
            Ok(n) if n == apps.len() + 2 => {
                info!("skipping application launch");
                MenuSelection::Skip
            }
            _ => {
                warn!(input = %answer, "invalid choice, skipping application launch");
                MenuSelection::Skip
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn apps() -> Vec<Application> {
        vec![
            Application {
                id: ApplicationId::WebSimulator,
                display_name: "Interactive Web Simulator".into(),
                entrypoint: CommandSpec::new("python3").arg("app/run_simulator.py"),
                mode: LaunchMode::Detached,
                port: Some(8501),
            },
            Application {
                id: ApplicationId::Dashboard,
                display_name: "Advanced Analytics Dashboard".into(),
                entrypoint: CommandSpec::new("python3").arg("dashboard/run_dashboard.py"),
                mode: LaunchMode::Detached,
                port: Some(8502),
            },
            Application {
                id: ApplicationId::DesktopGui,
                display_name: "Desktop GUI Application".into(),
                entrypoint: CommandSpec::new("python3").arg("app/simple_gui.py"),
                mode: LaunchMode::Detached,
                port: None,
            },
        ]
    }

    async fn select(answer: &str) -> MenuSelection {
        let prompter = Arc::new(ScriptedPrompter::new(&[answer]));
        LaunchMenu::new(prompter).present(&apps()).await
    }

    #[tokio::test]
    async fn ordinal_selects_the_matching_application() {
        assert_eq!(
            select("1").await,
            MenuSelection::One(ApplicationId::WebSimulator)
        );
        assert_eq!(
            select("3").await,
            MenuSelection::One(ApplicationId::DesktopGui)
        );
    }

    #[tokio::test]
    async fn launch_all_and_skip_are_after_the_apps() {
        assert_eq!(select("4").await, MenuSelection::All);
        assert_eq!(select("5").await, MenuSelection::Skip);
    }

    #[tokio::test]
    async fn invalid_input_degrades_to_skip() {
        assert_eq!(select("").await, MenuSelection::Skip);
        assert_eq!(select("banana").await, MenuSelection::Skip);
        assert_eq!(select("0").await, MenuSelection::Skip);
        assert_eq!(select("9").await, MenuSelection::Skip);
        assert_eq!(select("-1").await, MenuSelection::Skip);
    }

    #[tokio::test]
    async fn menu_lists_apps_with_ports_then_meta_options() {
        let prompter = Arc::new(ScriptedPrompter::new(&["5"]));
        LaunchMenu::new(prompter.clone()).present(&apps()).await;

        let questions = prompter.questions();
        assert_eq!(questions.len(), 1);
        let choices = &questions[0].choices;
        assert_eq!(choices.len(), 5);
        assert_eq!(choices[0], "Interactive Web Simulator (port 8501)");
        assert_eq!(choices[1], "Advanced Analytics Dashboard (port 8502)");
        assert_eq!(choices[2], "Desktop GUI Application");
        assert_eq!(choices[3], "All Applications");
        assert_eq!(choices[4], "Skip application launch");
    }
}
