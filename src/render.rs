//! Server-side HTML for the dashboard pages.
//!
//! Every page is a full document built from the shared layout. Charts are plain
//! HTML/CSS so the pages work without any script bundle.

use crate::analytics::{self, MeiFilter};
use crate::config::DisplayConfig;
use crate::insights::{self, Quadrant};
use crate::maps::{MapChoice, MapError};
use crate::types::{Datasets, RawTable};
use rayon::prelude::*;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

const STYLE: &str = r#"
body {margin: 0; font-family: sans-serif; display: flex; min-height: 100vh;}
nav {width: 260px; background: #f0f2f6; padding: 1rem; box-sizing: border-box;}
nav a {display: block; padding: .4rem .6rem; color: #262730; text-decoration: none; border-radius: 6px;}
nav a.active {background: #1f77b4; color: white;}
main {flex: 1; padding: 0 2rem;}
h1 {color: #1f77b4;}
.row {display: flex; gap: 1rem; flex-wrap: wrap;}
.col {flex: 1; min-width: 220px;}
.metric {background: #f0f2f6; padding: 15px; border-radius: 10px; flex: 1; min-width: 160px;}
.metric .label {color: #555; font-size: .9rem;}
.metric .value {font-size: 1.8rem; font-weight: bold;}
.metric .delta {color: #09ab3b; font-size: .85rem;}
.bar-row {display: flex; align-items: center; margin: 3px 0;}
.bar-label {width: 40%; font-size: .85rem; padding-right: 8px; text-align: right;}
.bar {height: 20px; background: #1f77b4; border-radius: 3px;}
.bar-value {padding-left: 6px; font-size: .8rem;}
.pie {width: 260px; height: 260px; border-radius: 50%;}
.donut::after {content: ""; display: block; width: 40%; height: 40%; margin: 30%; background: white; border-radius: 50%;}
.legend span {display: inline-block; width: 12px; height: 12px; margin-right: 6px;}
.error {background: #ffe0e0; color: #a00; padding: 1rem; border-radius: 8px;}
.info {background: #e0efff; color: #0a4b8c; padding: 1rem; border-radius: 8px;}
table {border-collapse: collapse; font-size: .85rem;}
th, td {border: 1px solid #ddd; padding: 4px 8px; text-align: left;}
footer {text-align: center; color: gray; margin: 2rem 0;}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Economy,
    Transport,
    Classification,
    Maps,
    RawData,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Overview,
        Page::Economy,
        Page::Transport,
        Page::Classification,
        Page::Maps,
        Page::RawData,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Overview => "/",
            Page::Economy => "/economia",
            Page::Transport => "/transporte",
            Page::Classification => "/classificacao",
            Page::Maps => "/mapas",
            Page::RawData => "/dados",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Page::Overview => "🏠 Visão Geral",
            Page::Economy => "💼 Análise Econômica",
            Page::Transport => "🚌 Análise de Transporte",
            Page::Classification => "🎯 Classificação de Bairros",
            Page::Maps => "🗺️ Mapas Interativos",
            Page::RawData => "📊 Dados Brutos",
        }
    }
}

/// Which registry the raw-data page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawDataset {
    #[default]
    Neighborhoods,
    Businesses,
    BusStops,
}

impl RawDataset {
    pub const ALL: [RawDataset; 3] = [RawDataset::Neighborhoods, RawDataset::Businesses, RawDataset::BusStops];

    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("empresas") => RawDataset::Businesses,
            Some("onibus") => RawDataset::BusStops,
            _ => RawDataset::Neighborhoods,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            RawDataset::Neighborhoods => "bairros",
            RawDataset::Businesses => "empresas",
            RawDataset::BusStops => "onibus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RawDataset::Neighborhoods => "Bairros",
            RawDataset::Businesses => "Empresas",
            RawDataset::BusStops => "Pontos de Ônibus",
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `1234567` -> `1,234,567`
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn layout(active: Page, body: &str) -> String {
    let mut nav = String::new();
    for page in Page::ALL {
        let class = if page == active { " class=\"active\"" } else { "" };
        nav.push_str(&format!("<a href=\"{}\"{}>{}</a>\n", page.path(), class, page.label()));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>Dashboard BH</title>
<style>{style}</style>
</head>
<body>
<nav>
<h2>🏙️ Dashboard BH</h2>
<hr>
{nav}<hr>
<h3>📌 Sobre</h3>
<div class="info"><b>Projeto:</b> Análise Espacial BH<br><b>Dados:</b> 2023-2025<br><b>Tech:</b> Rust, axum</div>
</nav>
<main>
{body}
<hr>
<footer><p>Dashboard BH | Dados: Prefeitura de Belo Horizonte | 2023-2025</p></footer>
</main>
</body>
</html>
"#,
        style = STYLE,
        nav = nav,
        body = body,
    )
}

/// Rendered in place of any page when the registries could not be loaded.
pub fn error_page(active: Page, message: &str) -> String {
    let body = format!(
        "<h1>🏙️ Dashboard BH</h1>\n<div class=\"error\">Erro ao carregar dados: {}</div>",
        escape(message)
    );
    layout(active, &body)
}

fn metric(label: &str, value: &str, delta: Option<&str>) -> String {
    let delta = delta
        .map(|d| format!("<div class=\"delta\">{}</div>", escape(d)))
        .unwrap_or_default();
    format!(
        "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div>{}</div>\n",
        escape(label),
        escape(value),
        delta
    )
}

fn bar_chart(rows: &[(String, usize)], label_width: usize) -> String {
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);
    let mut html = String::from("<div class=\"bars\">\n");
    for (label, count) in rows {
        // Bars share the row with a 40% label column.
        let width = *count as f64 / max as f64 * 50.0;
        html.push_str(&format!(
            "<div class=\"bar-row\"><div class=\"bar-label\" title=\"{}\">{}</div>\
             <div class=\"bar\" style=\"width: {:.1}%\"></div><div class=\"bar-value\">{}</div></div>\n",
            escape(label),
            escape(&analytics::truncate_label(label, label_width)),
            width,
            format_count(*count)
        ));
    }
    html.push_str("</div>\n");
    html
}

fn pie_chart(slices: &[(String, usize)], colors: &[&str], donut: bool) -> String {
    let total: usize = slices.iter().map(|(_, v)| *v).sum();
    if total == 0 {
        return "<div class=\"info\">Sem dados para exibir.</div>\n".to_string();
    }

    let mut stops = Vec::new();
    let mut legend = String::new();
    let mut start = 0.0;
    for (i, (label, value)) in slices.iter().enumerate() {
        let color = colors[i % colors.len()];
        let share = *value as f64 / total as f64 * 100.0;
        let end = start + share;
        stops.push(format!("{} {:.2}% {:.2}%", color, start, end));
        legend.push_str(&format!(
            "<div><span style=\"background: {}\"></span>{} ({:.1}%)</div>\n",
            color,
            escape(label),
            share
        ));
        start = end;
    }

    let class = if donut { "pie donut" } else { "pie" };
    format!(
        "<div class=\"row\"><div class=\"{}\" style=\"background: conic-gradient({})\"></div>\
         <div class=\"legend\">\n{}</div></div>\n",
        class,
        stops.join(", "),
        legend
    )
}

fn data_table<'a, I>(headers: &[String], rows: I) -> String
where
    I: IntoIterator<Item = &'a Vec<String>>,
{
    let mut html = String::from("<div style=\"overflow-x: auto\"><table>\n<tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table></div>\n");
    html
}

fn thousands_hint(n: usize) -> String {
    format!("{} mil", (n as f64 / 1000.0).round() as usize)
}

pub fn overview_page(data: &Datasets, display: &DisplayConfig) -> String {
    let businesses = &data.businesses.records;
    let mei = analytics::mei_summary(businesses);

    let mut body = String::from(
        "<h1>🏙️ Dashboard Executivo - Belo Horizonte</h1>\n\
         <h3>Análise de Transporte Público e Desenvolvimento Econômico</h3>\n<hr>\n<div class=\"row\">\n",
    );
    body.push_str(&metric("🏘️ Bairros", &format_count(data.neighborhoods.len()), Some("100% cobertura")));
    body.push_str(&metric(
        "💼 Empresas",
        &format_count(data.businesses.len()),
        Some(thousands_hint(data.businesses.len()).as_str()),
    ));
    body.push_str(&metric(
        "🚌 Pontos Ônibus",
        &format_count(data.bus_stops.len()),
        Some(thousands_hint(data.bus_stops.len()).as_str()),
    ));
    body.push_str(&metric(
        "🎯 MEIs",
        &format!("{:.1}%", mei.mei_percentage),
        Some(format!("{} empresas", format_count(mei.mei)).as_str()),
    ));
    body.push_str("</div>\n<hr>\n<h3>🔍 Principais Descobertas</h3>\n<div class=\"row\">\n");

    body.push_str(&format!(
        "<div class=\"col\">\n<h4>📊 Correlação Transporte × Economia</h4>\n<ul>\
         <li><b>Coeficiente de Pearson:</b> {:.3}</li>\
         <li><b>Interpretação:</b> Correlação MODERADA e POSITIVA</li>\
         <li><b>Conclusão:</b> Bairros com mais transporte TENDEM a ter mais empresas</li></ul>\n\
         <h4>💼 Perfil Empreendedor</h4>\n<ul>\
         <li><b>{:.1}%</b> das empresas são MEIs</li>\
         <li><b>{} microempreendedores</b> ativos</li>\
         <li>BH é uma cidade <b>altamente empreendedora</b></li></ul>\n</div>\n",
        insights::PEARSON_TRANSPORT_ECONOMY,
        insights::MEI_SHARE_PERCENT,
        format_count(insights::MEI_TOTAL),
    ));

    body.push_str("<div class=\"col\">\n<h4>🎯 Setores Predominantes</h4>\n<ol>");
    for sector in &insights::LEADING_SECTORS {
        body.push_str(&format!(
            "<li><b>{}:</b> {} empresas</li>",
            escape(sector.name),
            format_count(sector.businesses)
        ));
    }
    body.push_str("</ol>\n<h4>🗺️ Classificação de Bairros</h4>\n<ul>");
    for quadrant in Quadrant::ALL {
        body.push_str(&format!(
            "<li><span style=\"color: {}\">●</span> <b>{}% {}</b> ({} bairros)</li>",
            quadrant.color(),
            quadrant.share_percent(),
            quadrant.title(),
            quadrant.neighborhoods()
        ));
    }
    body.push_str("</ul>\n</div>\n</div>\n<hr>\n");

    body.push_str(&format!(
        "<h3>🏆 Top {} Bairros por Número de Empresas</h3>\n",
        display.top_neighborhoods
    ));
    let top = analytics::top_n(businesses, |b| b.neighborhood.as_str(), display.top_neighborhoods);
    body.push_str(&bar_chart(&top, usize::MAX));

    layout(Page::Overview, &body)
}

/// Selections made on the economy page.
#[derive(Debug, Clone, Default)]
pub struct EconomyView {
    pub mei: MeiFilter,
    pub neighborhood: Option<String>,
}

pub fn economy_page(data: &Datasets, display: &DisplayConfig, view: &EconomyView) -> String {
    let records = &data.businesses.records;
    let rows = analytics::filter_businesses(records, view.mei, view.neighborhood.as_deref());
    let summary = analytics::mei_summary(rows.iter().map(|&i| &records[i]));

    let choices = analytics::top_n(records, |b| b.neighborhood.as_str(), display.neighborhood_choices);

    let mut body = String::from("<h1>💼 Análise Econômica Detalhada</h1>\n<hr>\n<div class=\"row\">\n");

    body.push_str("<div class=\"col\" style=\"flex: 1\">\n<h3>🔍 Filtros</h3>\n<form method=\"get\" action=\"/economia\">\n<p>Tipo de Empresa</p>\n");
    for filter in MeiFilter::ALL {
        let checked = if filter == view.mei { " checked" } else { "" };
        body.push_str(&format!(
            "<label><input type=\"radio\" name=\"mei\" value=\"{}\"{} onchange=\"this.form.submit()\"> {}</label><br>\n",
            filter.param(),
            checked,
            filter.label()
        ));
    }
    body.push_str("<p>Selecione um Bairro</p>\n<select name=\"bairro\" onchange=\"this.form.submit()\">\n<option value=\"\">Todos</option>\n");
    for (name, _) in &choices {
        let selected = if view.neighborhood.as_deref() == Some(name.as_str()) { " selected" } else { "" };
        body.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>\n",
            escape(name),
            selected
        ));
    }
    // A neighborhood outside the ranked choices still filters, so keep it selectable.
    if let Some(name) = view.neighborhood.as_deref() {
        if !choices.iter().any(|(choice, _)| choice == name) {
            body.push_str(&format!("<option value=\"{0}\" selected>{0}</option>\n", escape(name)));
        }
    }
    body.push_str("</select>\n<noscript><button type=\"submit\">Aplicar</button></noscript>\n</form>\n</div>\n");

    body.push_str("<div class=\"col\" style=\"flex: 3\">\n<div class=\"row\">\n");
    body.push_str(&metric("Total Empresas", &format_count(summary.total), None));
    body.push_str(&metric("MEIs", &format_count(summary.mei), None));
    body.push_str(&metric("% MEIs", &format!("{:.1}%", summary.mei_percentage), None));
    body.push_str("</div>\n</div>\n</div>\n<hr>\n<div class=\"row\">\n");

    body.push_str(&format!(
        "<div class=\"col\">\n<h4>📊 Top {} CNAEs Mais Comuns</h4>\n",
        display.top_activities
    ));
    let top_cnaes = analytics::top_n(
        rows.par_iter().map(|&i| &records[i]),
        |b| b.cnae_description.as_str(),
        display.top_activities,
    );
    body.push_str(&bar_chart(&top_cnaes, display.activity_label_width));
    body.push_str("</div>\n");

    body.push_str("<div class=\"col\">\n<h4>🥧 Distribuição MEI vs Não-MEI</h4>\n");
    let slices = [
        ("MEI".to_string(), summary.mei),
        ("Não-MEI".to_string(), summary.non_mei),
    ];
    body.push_str(&pie_chart(&slices, &["#2ecc71", "#e74c3c"], true));
    body.push_str("</div>\n</div>\n");

    layout(Page::Economy, &body)
}

pub fn transport_page(data: &Datasets, display: &DisplayConfig) -> String {
    let stops = &data.bus_stops.records;
    let summary = analytics::transport_summary(stops);

    let mut body = String::from("<h1>🚌 Análise de Transporte Público</h1>\n<hr>\n<div class=\"row\">\n");
    body.push_str(&metric("🚌 Linhas de Ônibus", &format_count(summary.lines), None));
    body.push_str(&metric("📍 Pontos de Ônibus", &format_count(summary.stops), None));
    body.push_str(&metric("📊 Média Pontos/Linha", &format!("{:.1}", summary.stops_per_line), None));
    body.push_str("</div>\n<hr>\n<div class=\"row\">\n");

    body.push_str(&format!("<div class=\"col\">\n<h3>🏆 Top {} Linhas com Mais Pontos</h3>\n", display.top_lines));
    let top_lines = analytics::top_n(stops, |s| s.line_name.as_str(), display.top_lines);
    body.push_str(&bar_chart(&top_lines, display.line_label_width));
    body.push_str("</div>\n");

    body.push_str("<div class=\"col\">\n<h3>📊 Distribuição por Origem</h3>\n");
    let origins = analytics::top_n(stops, |s| s.origin.as_str(), display.top_origins);
    body.push_str(&pie_chart(&origins, &PALETTE, false));
    body.push_str("</div>\n</div>\n");

    layout(Page::Transport, &body)
}

pub fn classification_page() -> String {
    let mut body = String::from(
        "<h1>🎯 Matriz de Classificação de Bairros</h1>\n<hr>\n\
         <h3>📊 Metodologia</h3>\n<p>Bairros classificados em 4 categorias baseadas em:</p>\n<ul>\
         <li><b>Eixo X:</b> Densidade de Transporte (pontos de ônibus/km²)</li>\
         <li><b>Eixo Y:</b> Densidade Econômica (empresas/km²)</li>\
         <li><b>Limiar:</b> Mediana de cada métrica</li></ul>\n<div class=\"row\">\n",
    );

    for quadrant in Quadrant::ALL {
        let level = |high: bool| if high { "Alta" } else { "Baixa" };
        let star = if quadrant == Quadrant::Opportunity { " ⭐" } else { "" };
        body.push_str(&format!(
            "<div class=\"col\" style=\"border-top: 6px solid {}\">\n<h3>{}</h3>\n\
             <p><b>{} bairros ({}%)</b>{}</p>\n<p>{} economia +<br>{} transporte</p>\n<p><b>Ação:</b> {}</p>\n</div>\n",
            quadrant.color(),
            quadrant.title(),
            quadrant.neighborhoods(),
            quadrant.share_percent(),
            star,
            level(quadrant.economy_high()),
            if quadrant.transport_high() { "Alto" } else { "Baixo" },
            quadrant.action()
        ));
    }
    body.push_str("</div>\n<hr>\n<h3>🟡 TOP 10 OPORTUNIDADES (investir em transporte)</h3>\n");

    let headers = ["Bairro", "Empresas", "Dens.Econ", "Dens.Trans"].map(String::from);
    let rows: Vec<Vec<String>> = insights::TOP_OPPORTUNITIES.iter()
        .map(|o| vec![
            o.neighborhood.to_string(),
            o.businesses.to_string(),
            o.economic_density.to_string(),
            o.transport_density.to_string(),
        ])
        .collect();
    body.push_str(&data_table(&headers, &rows));

    layout(Page::Classification, &body)
}

pub fn maps_page(choice: MapChoice, map: Result<String, MapError>) -> String {
    let mut body = String::from(
        "<h1>🗺️ Mapas Interativos</h1>\n<hr>\n<h3>📍 Visualizações Geoespaciais</h3>\n\
         <form method=\"get\" action=\"/mapas\">\n<label>Escolha o mapa <select name=\"mapa\" onchange=\"this.form.submit()\">\n",
    );
    for option in MapChoice::ALL {
        let selected = if option == choice { " selected" } else { "" };
        body.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            option.param(),
            selected,
            option.label()
        ));
    }
    body.push_str("</select></label>\n<noscript><button type=\"submit\">Abrir</button></noscript>\n</form>\n");

    match map {
        Ok(html) => {
            body.push_str(&format!(
                "<iframe srcdoc=\"{}\" style=\"width: 100%; height: 600px; border: none\" scrolling=\"yes\"></iframe>\n\
                 <p><a href=\"/mapas/download?mapa={}\" download=\"{}\">📥 Download do Mapa (HTML)</a></p>\n",
                escape(&html),
                choice.param(),
                choice.file_name()
            ));
        }
        Err(err) => {
            body.push_str(&format!("<div class=\"error\">{}</div>\n", escape(&err.to_string())));
            body.push_str("<div class=\"info\">Execute as células que geram os mapas primeiro!</div>\n");
        }
    }

    layout(Page::Maps, &body)
}

fn preview(table: &RawTable, rows: &[usize], limit: usize) -> String {
    data_table(&table.headers, rows.iter().take(limit).map(|&i| &table.rows[i]))
}

pub fn raw_data_page(data: &Datasets, display: &DisplayConfig, dataset: RawDataset, query: &str) -> String {
    let mut body = String::from(
        "<h1>📊 Exploração de Dados Brutos</h1>\n<hr>\n<form method=\"get\" action=\"/dados\">\n\
         <label>Selecione o dataset <select name=\"dataset\" onchange=\"this.form.submit()\">\n",
    );
    for option in RawDataset::ALL {
        let selected = if option == dataset { " selected" } else { "" };
        body.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            option.param(),
            selected,
            option.label()
        ));
    }
    body.push_str("</select></label>\n");

    match dataset {
        RawDataset::Neighborhoods => {
            let table = &data.neighborhoods.table;
            body.push_str("<noscript><button type=\"submit\">Abrir</button></noscript>\n</form>\n");
            body.push_str(&format!("<h3>🏘️ Bairros ({} registros)</h3>\n", table.rows.len()));
            body.push_str(&data_table(&table.headers, table.head(display.preview_rows)));
        }
        RawDataset::Businesses => {
            let table = &data.businesses.table;
            body.push_str(&format!(
                "<p><label>🔍 Buscar por nome fantasia ou CNAE <input type=\"text\" name=\"busca\" value=\"{}\"></label>\
                 <button type=\"submit\">Buscar</button></p>\n</form>\n",
                escape(query)
            ));
            body.push_str(&format!("<h3>💼 Empresas ({} registros)</h3>\n", format_count(table.rows.len())));
            if query.is_empty() {
                body.push_str(&data_table(&table.headers, table.head(display.preview_rows)));
            } else {
                let hits = analytics::search_businesses(&data.businesses.records, query);
                body.push_str(&format!("<p><b>{} resultados encontrados</b></p>\n", hits.len()));
                body.push_str(&preview(table, &hits, display.preview_rows));
            }
        }
        RawDataset::BusStops => {
            let table = &data.bus_stops.table;
            body.push_str("<noscript><button type=\"submit\">Abrir</button></noscript>\n</form>\n");
            body.push_str(&format!("<h3>🚌 Pontos de Ônibus ({} registros)</h3>\n", format_count(table.rows.len())));
            body.push_str(&data_table(&table.headers, table.head(display.preview_rows)));
        }
    }

    layout(Page::RawData, &body)
}
