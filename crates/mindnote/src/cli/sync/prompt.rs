//! Interactive conflict resolution on the terminal.

use std::io::{self, BufRead, Write};

use mindnote_core::gateway::{BoxFuture, MigrationDiff, Side};
use mindnote_core::resolver::{
    ConflictDecision, ConflictDiff, ConflictResolution, ConflictResolver, MigrationDecision,
};

/// Asks the user on stdin. End of input or `c` cancels the sync.
///
/// Terminal reads run on tokio's blocking pool, so the coordinator's
/// cancellation and the runtime's other tasks keep going while the
/// question is open.
pub struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn resolve_conflicts<'a>(
        &'a self,
        diff: &'a ConflictDiff,
    ) -> BoxFuture<'a, Option<ConflictDecision>> {
        let diff = diff.clone();
        Box::pin(async move {
            on_terminal(move |prompt| ask_conflicts(prompt, &diff)).await
        })
    }

    fn resolve_migration<'a>(
        &'a self,
        diff: &'a MigrationDiff,
    ) -> BoxFuture<'a, Option<MigrationDecision>> {
        let diff = diff.clone();
        Box::pin(async move {
            on_terminal(move |prompt| ask_migration(prompt, &diff)).await
        })
    }
}

/// Run a dialog against stdin/stdout without blocking the async runtime.
async fn on_terminal<T, F>(dialog: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Prompt<io::StdinLock<'static>, io::Stdout>) -> Option<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let mut prompt = Prompt::new(io::stdin().lock(), io::stdout());
        dialog(&mut prompt)
    });
    match task.await {
        Ok(answer) => answer,
        Err(e) => {
            log::warn!("Conflict prompt stopped: {}", e);
            None
        }
    }
}

/// A question/answer channel over any reader and writer.
struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.output, "{}", line);
    }

    /// Read one trimmed, lowercased answer. `None` on end of input.
    fn answer(&mut self, question: &str) -> Option<String> {
        let _ = write!(self.output, "{} ", question);
        let _ = self.output.flush();

        let mut input = String::new();
        match self.input.read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_lowercase()),
        }
    }
}

fn short(version: &str) -> &str {
    version.get(..8).unwrap_or(version)
}

fn ask_conflicts<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    diff: &ConflictDiff,
) -> Option<ConflictDecision> {
    prompt.say("");
    prompt.say("Conflicts");
    prompt.say("=========");

    let mut decision = ConflictDecision::default();
    for conflict in &diff.conflicts {
        prompt.say(&format!(
            "'{}' changed on both sides (local {}, remote {})",
            conflict.title,
            short(&conflict.local_version),
            short(&conflict.remote_version)
        ));
        let resolution = loop {
            match prompt
                .answer("  Keep [l]ocal, keep [r]emote, or [c]ancel sync?")?
                .as_str()
            {
                "l" | "local" => break ConflictResolution::KeepLocal,
                "r" | "remote" => break ConflictResolution::KeepRemote,
                "c" | "cancel" => return None,
                _ => prompt.say("  Please answer l, r or c."),
            }
        };
        decision = decision.with_choice(conflict.title.clone(), resolution);
    }
    Some(decision)
}

fn ask_migration<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    diff: &MigrationDiff,
) -> Option<MigrationDecision> {
    prompt.say("");
    prompt.say("Move guest workspaces into your account");
    prompt.say("=======================================");

    let mut decision = MigrationDecision::accept_all();
    for conflict in &diff.conflicts {
        prompt.say(&format!(
            "'{}' exists in both guest and account storage",
            conflict.title
        ));
        let side = loop {
            match prompt
                .answer("  Keep the [g]uest copy, the [a]ccount copy, or [c]ancel?")?
                .as_str()
            {
                "g" | "guest" => break Side::Local,
                "a" | "account" => break Side::Server,
                "c" | "cancel" => return None,
                _ => prompt.say("  Please answer g, a or c."),
            }
        };
        decision = decision.with_side(conflict.title.clone(), side);
    }

    for doc in &diff.new {
        let question = format!("Add '{}' to your account? [Y/n/c]", doc.title);
        let adopt = loop {
            match prompt.answer(&question)?.as_str() {
                "" | "y" | "yes" => break true,
                "n" | "no" => break false,
                "c" | "cancel" => return None,
                _ => prompt.say("  Please answer y, n or c."),
            }
        };
        decision = decision.with_new(doc.title.clone(), adopt);
    }

    if !diff.server_only.is_empty() {
        let titles: Vec<&str> = diff.server_only.iter().map(|d| d.title.as_str()).collect();
        prompt.say(&format!("Already in your account: {}", titles.join(", ")));
    }
    Some(decision)
}
