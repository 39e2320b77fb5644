//! Executive-summary generation.
//!
//! The summary is produced by an external [`NarrativeGenerator`] when one is
//! configured. If it is missing, fails, or returns blank text, a
//! deterministic summary is built from the first and last exams instead.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::model::{Area, CohortStatistics};
use crate::statistics::growth;
use crate::traits::{NarrativeGenerator, NarrativeRequest};

/// Default model for narrative requests.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f64 = 0.7;

/// Where a summary's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Generated,
    Fallback,
}

/// An executive summary for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub text: String,
    pub source: SummarySource,
}

/// Build the generator prompt for `area`.
pub fn build_prompt(stats: &[CohortStatistics], area: Area) -> String {
    let lines = stats
        .iter()
        .map(|s| {
            format!(
                "{} ({}): Média TRI {:.1}, Média Acertos {:.1}, >800: {} alunos",
                s.exam_name, s.date, s.average_tri, s.average_raw, s.distribution.above_800
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Atue como um Consultor Sênior de Inteligência Pedagógica apresentando resultados \
para a diretoria de uma rede de ensino.

Área Analisada: {area}

Dados da Evolução Global (Média da Cohort):
{lines}

Escreva um \"Sumário Executivo de Impacto\" (máximo 150 palavras) que:
1. Destaque o crescimento percentual ou absoluto da média TRI do início ao fim do ano.
2. Relacione a evolução ao ciclo de simulados e intervenções individualizadas.
3. Use linguagem pedagógica de alto nível.

Não use saudações. Vá direto ao ponto. Use formatação Markdown."
    )
}

/// Deterministic markdown summary from the first and last exams.
pub fn fallback_summary(stats: &[CohortStatistics], area: Area) -> String {
    let Some(g) = growth(stats) else {
        return format!(
            "## Análise Executiva - {area}\n\n\
Sem dados de simulados para esta área.\n\n\
*Nota: Análise gerada automaticamente.*"
        );
    };

    let top_band = match g.top_band_change {
        0 => "Número de alunos com TRI ≥800 estável".to_string(),
        n if n > 0 => format!("Aumento de {n} aluno(s) com TRI ≥800"),
        n => format!("Redução de {} aluno(s) com TRI ≥800", n.unsigned_abs()),
    };

    format!(
        "## Análise Executiva - {area}\n\n\
**Evolução Demonstrada**: A cohort apresentou variação de **{:.1}%** ({:+.1} pontos) \
na média TRI, partindo de {:.1} em {} e atingindo {:.1} em {}.\n\n\
**Proficiência**: {top_band} entre o primeiro e o último simulado.\n\n\
*Nota: Análise gerada automaticamente. Gerador de narrativa indisponível.*",
        g.percent,
        g.absolute,
        g.initial_average,
        g.initial_exam,
        g.final_average,
        g.final_exam,
    )
}

/// Produce the executive summary for `area`.
///
/// Never fails: generator errors and blank output are logged and replaced by
/// [`fallback_summary`].
pub async fn executive_summary(
    generator: Option<&dyn NarrativeGenerator>,
    stats: &[CohortStatistics],
    area: Area,
    model: &str,
) -> ExecutiveSummary {
    let fallback = || ExecutiveSummary {
        text: fallback_summary(stats, area),
        source: SummarySource::Fallback,
    };

    let Some(generator) = generator else {
        return fallback();
    };
    if stats.is_empty() {
        return fallback();
    }

    let request = NarrativeRequest {
        model: model.to_string(),
        prompt: build_prompt(stats, area),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    let start = Instant::now();
    match generator.generate(&request).await {
        Ok(response) if !response.text.trim().is_empty() => {
            tracing::info!(
                generator = generator.name(),
                model = %response.model,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "generated executive summary for {area}"
            );
            ExecutiveSummary {
                text: response.text,
                source: SummarySource::Generated,
            }
        }
        Ok(_) => {
            tracing::warn!(generator = generator.name(), "generator returned blank text");
            fallback()
        }
        Err(e) => {
            tracing::warn!(generator = generator.name(), "narrative generation failed: {e:#}");
            fallback()
        }
    }
}
