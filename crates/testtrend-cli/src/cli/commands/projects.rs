use serde::Serialize;
use testtrend_core::TrendEngine;

use super::super::args::ProjectsArgs;
use super::history;
use super::output::emit;
use crate::exit_codes::EXIT_SUCCESS;

#[derive(Serialize)]
struct ProjectsReport {
    build: u32,
    projects: Vec<String>,
}

pub(crate) fn run(args: ProjectsArgs) -> anyhow::Result<i32> {
    let settings = history::settings(&args.history)?;
    let loaded = history::load(&args.history)?;
    let engine = TrendEngine::new(&*loaded.provider, settings);

    let report = ProjectsReport {
        build: loaded.start.build_number,
        projects: engine.project_list(&loaded.start),
    };
    emit(&args.output, &report, || {
        report.projects.iter().map(|p| format!("{p}\n")).collect()
    })?;
    Ok(EXIT_SUCCESS)
}
