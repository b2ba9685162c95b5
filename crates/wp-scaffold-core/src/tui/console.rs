//! Terminal adapters for the prompt and reporting seams

use crate::answers::{Answer, Prompt, PromptKind, Prompter};
use crate::pipeline::{Reporter, RunReport, Stage, StageStatus};
use anyhow::Result;
use colored::Colorize;
use std::io;

/// Asks prompts inline with cliclack
pub struct CliclackPrompter;

impl Prompter for CliclackPrompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer> {
        let answer = match prompt.kind {
            PromptKind::Confirm { default } => Answer::Flag(
                cliclack::confirm(&prompt.message)
                    .initial_value(default)
                    .interact()?,
            ),
            PromptKind::Secret => {
                Answer::Text(cliclack::password(&prompt.message).mask('▪').interact()?)
            }
            PromptKind::Text => {
                // Empty answers fall back to the default in the collector
                let mut input = cliclack::input(&prompt.message).required(false);
                if let Some(default) = &prompt.default {
                    input = input.placeholder(default);
                }
                Answer::Text(input.interact()?)
            }
        };
        Ok(answer)
    }

    fn reject(&mut self, _prompt: &Prompt, reason: &str) -> Result<()> {
        cliclack::log::warning(reason)?;
        Ok(())
    }
}

/// Reports pipeline progress with cliclack's log lines
pub struct CliclackReporter;

/// Progress lines are best effort: a failed terminal write is dropped and
/// never stops the run. Prompts still propagate their errors.
fn emit(result: io::Result<()>) {
    let _ = result;
}

impl Reporter for CliclackReporter {
    fn stage_started(&self, stage: Stage) {
        emit(cliclack::log::step(stage.label()));
    }

    fn stage_finished(&self, stage: Stage, status: &StageStatus) {
        emit(match status {
            StageStatus::Completed => Ok(()),
            StageStatus::Skipped(reason) => cliclack::log::remark(format!("Skipped: {}", reason)),
            StageStatus::Recovered(error) => {
                cliclack::log::warning(format!("{} failed, continuing: {}", stage, error))
            }
            StageStatus::Fatal(error) => cliclack::log::error(format!("{} failed: {}", stage, error)),
        });
    }

    fn info(&self, message: &str) {
        emit(cliclack::log::info(message));
    }

    fn warning(&self, message: &str) {
        emit(cliclack::log::warning(message));
    }

    fn summary(&self, report: &RunReport, next_steps: &[String]) {
        println!();
        for (stage, status) in report.entries() {
            let mark = match status {
                StageStatus::Completed => "✓".green(),
                StageStatus::Skipped(_) => "-".dimmed(),
                StageStatus::Recovered(_) => "!".yellow(),
                StageStatus::Fatal(_) => "✗".red(),
            };
            println!("  {} {:<24} {}", mark, stage.label(), status.to_string().dimmed());
        }

        println!();
        println!("  Next steps");
        println!();

        for (i, step) in next_steps.iter().enumerate() {
            println!("  {}.  {}", i + 1, step);
        }
        println!();
    }
}
