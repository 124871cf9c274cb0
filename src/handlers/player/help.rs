//! `/help [page|admin|mod|member]`

use crate::caps::Perm;
use crate::error::{HandlerResult, Reply};
use crate::handlers::core::{CommandDef, Context, Handler, page_count, page_from_token};
use async_trait::async_trait;

pub struct HelpHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Normal,
    Member,
    Mod,
    Admin,
}

impl Section {
    fn of(perm: Perm) -> Self {
        match perm {
            Perm::All | Perm::NotGriefer => Section::Normal,
            Perm::Member => Section::Member,
            Perm::Mod => Section::Mod,
            Perm::Admin | Perm::Manager => Section::Admin,
        }
    }

    fn color(self) -> &'static str {
        match self {
            Section::Normal => "[sky]",
            Section::Member => "[pink]",
            Section::Mod => "[acid]",
            Section::Admin => "[cyan]",
        }
    }
}

fn line(def: &CommandDef, section: Section) -> String {
    let usage = def.usage();
    let params = usage
        .strip_prefix(&format!("/{}", def.name))
        .unwrap_or_default()
        .trim();
    let params = if params.is_empty() {
        String::new()
    } else {
        format!("[white]{params} ")
    };
    format!(
        "{}/{} {params}[lightgrey]- {}",
        section.color(),
        def.name,
        def.description
    )
}

fn section_lines(ctx: &Context<'_>, section: Section) -> Vec<String> {
    ctx.server
        .registry
        .list_commands(|d| Section::of(d.perm) == section)
        .into_iter()
        .map(|d| line(d, section))
        .collect()
}

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &mut Context<'_>) -> HandlerResult {
        let page = ctx.args.opt_string("page").map(str::to_ascii_lowercase);
        let (title, section) = match page.as_deref() {
            Some("admin") => ("[cyan]--Admin commands--", Section::Admin),
            Some("mod") => ("[acid]--Mod commands--", Section::Mod),
            Some("member") => ("[pink]--Member commands--", Section::Member),
            _ => {
                let lines = section_lines(ctx, Section::Normal);
                let size = ctx.server.config.limits.help_page_size;
                let (chunk, number) = page_from_token(&lines, size, page.as_deref().unwrap_or("1"))?;
                return Ok(Reply::Plain(format!(
                    "[sky]--Commands page [lightgrey]{number}/{} [sky]--\n{}",
                    page_count(lines.len(), size),
                    chunk.join("\n")
                )));
            }
        };
        Ok(Reply::Plain(format!(
            "{title}\n{}",
            section_lines(ctx, section).join("\n")
        )))
    }
}
