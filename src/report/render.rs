//! HTML rendering for printable reports.
//!
//! Output is a self-contained document sized to A4 at 96 DPI (794x1123 px
//! per page) with `page-break-after` between pages and a forced print
//! color-adjust so browsers do not lighten colors when printing.

use crate::models::{LabSettings, LabTest, Patient, Sample, SampleInterpretation, SampleResult};

use super::data::{build_pages, ReportData, ReportPage};
use super::template::{
    fallback_components, parse_template, ComponentKind, ParsedTemplate, TemplateComponent,
};

pub const PAGE_WIDTH_PX: u32 = 794;
pub const PAGE_HEIGHT_PX: u32 = 1123;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(escape_html).unwrap_or_default()
}

fn component_style(component: &TemplateComponent) -> String {
    match component.font_size {
        Some(size) => format!(" style=\"font-size:{size}px\""),
        None => String::new(),
    }
}

fn render_header(
    settings: &LabSettings,
    title: &Option<String>,
    subtitle: &Option<String>,
    style: &str,
) -> String {
    let title = title.as_deref().unwrap_or(&settings.lab_name);
    let subtitle = subtitle
        .clone()
        .or_else(|| settings.lab_subtitle.clone())
        .unwrap_or_default();
    format!(
        "<div class=\"header\"{style}><h1>{}</h1><p>{}</p><p class=\"contact\">{}</p></div>",
        escape_html(title),
        escape_html(&subtitle),
        opt(&settings.contact),
    )
}

fn render_logo(settings: &LabSettings, url: &Option<String>) -> String {
    let url = url.clone().or_else(|| settings.logo_url.clone());
    match url {
        Some(url) => format!(
            "<div class=\"logo\"><img src=\"{}\" alt=\"logo\"/></div>",
            escape_html(&url)
        ),
        None => String::new(),
    }
}

fn render_patient_info(data: &ReportData, page_title: &Option<String>, style: &str) -> String {
    let age = data
        .patient_age
        .map(|a| a.to_string())
        .unwrap_or_default();
    let test_line = match page_title {
        Some(title) => format!(
            "<div><span>Test</span><strong>{}</strong></div>",
            escape_html(title)
        ),
        None => String::new(),
    };
    format!(
        "<div class=\"patient-info\"{style}>\
         <div><span>Patient</span><strong>{}</strong></div>\
         <div><span>Age / Gender</span><strong>{} / {}</strong></div>\
         <div><span>Sample No</span><strong>{}</strong></div>\
         <div><span>Referred By</span><strong>{}</strong></div>\
         <div><span>Collected</span><strong>{}</strong></div>\
         {test_line}\
         </div>",
        escape_html(&data.patient_name),
        escape_html(&age),
        opt(&data.patient_gender),
        escape_html(&data.sample_no),
        opt(&data.referred_by),
        escape_html(&data.collected_at),
    )
}

fn render_result_table(data: &ReportData, style: &str) -> String {
    let mut rows = String::new();
    for row in &data.rows {
        let flag = row
            .flag
            .map(|f| format!("<span class=\"flag flag-{}\">{}</span>", f.as_str(), f.as_str()))
            .unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{} {flag}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.parameter_name),
            escape_html(&row.value),
            opt(&row.unit),
            opt(&row.reference_range),
        ));
    }
    format!(
        "<table class=\"result-table\"{style}>\
         <thead><tr><th>Parameter</th><th>Result</th><th>Unit</th><th>Reference Range</th></tr></thead>\
         <tbody>{rows}</tbody></table>"
    )
}

fn render_notes(data: &ReportData, heading: &Option<String>, style: &str) -> String {
    let Some(notes) = &data.clinical_notes else {
        return String::new();
    };
    let heading = heading.as_deref().unwrap_or("Clinical Notes");
    format!(
        "<div class=\"notes\"{style}><h3>{}</h3><p>{}</p></div>",
        escape_html(heading),
        escape_html(notes).replace('\n', "<br/>"),
    )
}

fn render_analyte_summary(data: &ReportData, style: &str) -> String {
    let flagged = data.rows.iter().filter(|r| r.flag.is_some()).count();
    format!(
        "<div class=\"analyte-summary\"{style}>{} analytes reported, {} outside reference range</div>",
        data.rows.len(),
        flagged,
    )
}

fn render_consultant(name: &Option<String>, designation: &Option<String>, style: &str) -> String {
    let name = name.as_deref().unwrap_or("Consultant Pathologist");
    format!(
        "<div class=\"consultant\"{style}>\
         <div class=\"signature-line\"></div>\
         <strong>{}</strong><p>{}</p></div>",
        escape_html(name),
        opt(designation),
    )
}

/// Render one page. Components render in list order, except that every
/// consultant-section is pulled out and pinned to the page bottom.
fn render_page(settings: &LabSettings, template: &ParsedTemplate, page: &ReportPage) -> String {
    let components = if template.components.is_empty() {
        fallback_components()
    } else {
        template.components.clone()
    };

    let mut body = String::new();
    let mut footer = String::new();

    for component in &components {
        let style = component_style(component);
        match &component.kind {
            ComponentKind::HeaderText { title, subtitle } => {
                body.push_str(&render_header(settings, title, subtitle, &style));
            }
            ComponentKind::PatientInfo => {
                body.push_str(&render_patient_info(&page.data, &page.title, &style));
            }
            ComponentKind::ResultTable => {
                body.push_str(&render_result_table(&page.data, &style));
            }
            ComponentKind::Logo { url } => {
                body.push_str(&render_logo(settings, url));
            }
            ComponentKind::Notes { heading } => {
                body.push_str(&render_notes(&page.data, heading, &style));
            }
            ComponentKind::AnalyteSummary => {
                body.push_str(&render_analyte_summary(&page.data, &style));
            }
            ComponentKind::ConsultantSection { name, designation } => {
                footer.push_str(&render_consultant(name, designation, &style));
            }
        }
    }

    format!(
        "<div class=\"report-page\"><div class=\"page-body\">{body}</div>\
         <div class=\"page-footer\">{footer}</div></div>"
    )
}

fn document_css(template: &ParsedTemplate) -> String {
    format!(
        "* {{ margin: 0; padding: 0; box-sizing: border-box; \
           -webkit-print-color-adjust: exact; print-color-adjust: exact; }}\
         body {{ font-family: Arial, sans-serif; font-size: {font}px; }}\
         .report-page {{ width: {w}px; height: {h}px; padding: 32px; \
           display: flex; flex-direction: column; page-break-after: always; }}\
         .page-body {{ flex: 1; }}\
         .page-footer {{ margin-top: auto; }}\
         .header h1 {{ color: {header}; }}\
         .patient-info div {{ display: inline-block; margin-right: 24px; }}\
         .patient-info span {{ display: block; font-size: 0.8em; color: #666; }}\
         .result-table {{ width: 100%; border-collapse: collapse; margin-top: 16px; }}\
         .result-table th, .result-table td \
           {{ border-bottom: 1px {border} #ccc; padding: 6px 8px; text-align: left; }}\
         .flag {{ font-size: 0.8em; font-weight: bold; color: #b00020; }}\
         .notes {{ margin-top: 16px; }}\
         .consultant {{ text-align: right; }}\
         .signature-line {{ border-top: 1px solid #333; width: 200px; \
           margin-left: auto; margin-bottom: 4px; }}",
        font = template.styles.font_size,
        header = template.styles.header_color,
        border = template.styles.border_style,
        w = PAGE_WIDTH_PX,
        h = PAGE_HEIGHT_PX,
    )
}

fn wrap_document(title: &str, css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"/>\
         <title>{}</title><style>{css}</style></head><body>{body}</body></html>",
        escape_html(title),
    )
}

/// Render the full report: parse the stored template (or fall back to the
/// default layout), fan the results out into pages, and concatenate.
pub fn render_report(
    settings: &LabSettings,
    sample: &Sample,
    patient: &Patient,
    catalog: &[LabTest],
    results: &[SampleResult],
    interpretations: &[SampleInterpretation],
) -> String {
    let template = settings
        .report_template
        .as_ref()
        .map(parse_template)
        .unwrap_or_else(|| ParsedTemplate {
            components: Vec::new(),
            styles: Default::default(),
        });

    let pages = build_pages(sample, patient, catalog, results, interpretations);
    let body: String = pages
        .iter()
        .map(|page| render_page(settings, &template, page))
        .collect();

    let title = format!("Report {}", sample.sample_no);
    wrap_document(&title, &document_css(&template), &body)
}

/// Receipt-style slip used when the full report data cannot be assembled
/// (for instance when the patient record is gone). Lists the ordered tests
/// without results so the front desk still has something to hand over.
pub fn render_slip(settings: &LabSettings, sample: &Sample, patient_name: &str) -> String {
    let mut tests = String::new();
    for test in &sample.tests {
        tests.push_str(&format!("<li>{}</li>", escape_html(&test.test_name)));
    }

    let body = format!(
        "<div class=\"slip\"><h2>{}</h2><p>{}</p>\
         <div><span>Sample No</span> <strong>{}</strong></div>\
         <div><span>Patient</span> <strong>{}</strong></div>\
         <div><span>Collected</span> <strong>{}</strong></div>\
         <ul>{tests}</ul></div>",
        escape_html(&settings.lab_name),
        opt(&settings.lab_subtitle),
        escape_html(&sample.sample_no),
        escape_html(patient_name),
        escape_html(&sample.collected_at.format("%d %b %Y %H:%M").to_string()),
    );

    let css = "* { -webkit-print-color-adjust: exact; print-color-adjust: exact; }\
               body { font-family: Arial, sans-serif; }\
               .slip { width: 300px; padding: 16px; border: 1px dashed #999; }\
               .slip span { color: #666; }";

    let title = format!("Slip {}", sample.sample_no);
    wrap_document(&title, css, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use crate::models::{OrderedTest, ResultFlag, SampleStatus};

    fn settings(template: Option<serde_json::Value>) -> LabSettings {
        LabSettings {
            lab_name: "Sunrise Diagnostics".into(),
            lab_subtitle: Some("NABL Accredited".into()),
            logo_url: None,
            contact: Some("011-4040".into()),
            report_template: template,
            revision: 1,
        }
    }

    fn sample(tests: Vec<OrderedTest>) -> Sample {
        Sample {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            sample_no: "S-0042".into(),
            tests,
            status: SampleStatus::Completed,
            priority: None,
            referred_by: None,
            collected_at: Utc::now(),
        }
    }

    fn patient() -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: "Asha Verma".into(),
            age: Some(34),
            gender: Some("F".into()),
            phone: None,
            email: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    fn result(s: &Sample, parameter_id: &str, value: &str) -> SampleResult {
        SampleResult {
            id: Uuid::new_v4(),
            sample_id: s.id,
            parameter_id: parameter_id.into(),
            value: value.into(),
            unit: None,
            flag: None,
            entered_by: None,
            entered_at: Utc::now(),
        }
    }

    fn page_count(html: &str) -> usize {
        html.matches("class=\"report-page\"").count()
    }

    #[test]
    fn two_test_keys_make_two_pages() {
        let s = sample(vec![
            OrderedTest { test_id: "cbc".into(), test_name: "CBC".into() },
            OrderedTest { test_id: "lft".into(), test_name: "LFT".into() },
        ]);
        let results = vec![
            result(&s, "cbc::hb", "12.5"),
            result(&s, "lft::alt", "31"),
        ];

        let html = render_report(&settings(None), &s, &patient(), &[], &results, &[]);
        assert_eq!(page_count(&html), 2);
        assert!(html.contains("CBC"));
        assert!(html.contains("LFT"));
    }

    #[test]
    fn unprefixed_results_make_one_page() {
        let s = sample(vec![]);
        let results = vec![result(&s, "glucose", "95"), result(&s, "urea", "28")];
        let html = render_report(&settings(None), &s, &patient(), &[], &results, &[]);
        assert_eq!(page_count(&html), 1);
        assert!(html.contains("glucose"));
        assert!(html.contains("urea"));
    }

    #[test]
    fn empty_components_use_fallback_order() {
        let s = sample(vec![]);
        let results = vec![result(&s, "glucose", "95")];
        let interps = vec![crate::models::SampleInterpretation {
            id: Uuid::new_v4(),
            sample_id: s.id,
            test_key: "general".into(),
            text: "Within limits.".into(),
        }];

        let html = render_report(
            &settings(Some(json!({"components": []}))),
            &s,
            &patient(),
            &[],
            &results,
            &interps,
        );

        let header = html.find("class=\"header\"").unwrap();
        let info = html.find("class=\"patient-info\"").unwrap();
        let table = html.find("class=\"result-table\"").unwrap();
        let notes = html.find("class=\"notes\"").unwrap();
        assert!(header < info && info < table && table < notes);
    }

    #[test]
    fn consultant_section_is_pinned_to_footer() {
        let template = json!({
            "components": [
                {"id": "c1", "type": "consultant-section", "data": {"name": "Dr. Rao"}},
                {"id": "c2", "type": "result-table", "data": {}}
            ]
        });
        let s = sample(vec![]);
        let results = vec![result(&s, "glucose", "95")];
        let html = render_report(&settings(Some(template)), &s, &patient(), &[], &results, &[]);

        let footer = html.find("class=\"page-footer\"").unwrap();
        let consultant = html.find("class=\"consultant\"").unwrap();
        let table = html.find("class=\"result-table\"").unwrap();
        assert!(table < footer, "body content renders before the footer");
        assert!(footer < consultant, "consultant sits inside the footer");
        assert!(html.contains("Dr. Rao"));
    }

    #[test]
    fn values_are_html_escaped() {
        let s = sample(vec![]);
        let results = vec![result(&s, "note", "<script>alert(1)</script>")];
        let html = render_report(&settings(None), &s, &patient(), &[], &results, &[]);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn page_dimensions_and_print_styles_present() {
        let s = sample(vec![]);
        let html = render_report(&settings(None), &s, &patient(), &[], &[], &[]);
        assert!(html.contains("width: 794px"));
        assert!(html.contains("height: 1123px"));
        assert!(html.contains("page-break-after: always"));
        assert!(html.contains("print-color-adjust: exact"));
    }

    #[test]
    fn flagged_rows_are_marked() {
        let s = sample(vec![]);
        let mut r = result(&s, "hb", "9.1");
        r.flag = Some(ResultFlag::Low);
        let html = render_report(&settings(None), &s, &patient(), &[], &[r], &[]);
        assert!(html.contains("flag-low"));
    }

    #[test]
    fn slip_lists_ordered_tests() {
        let s = sample(vec![OrderedTest {
            test_id: "cbc".into(),
            test_name: "CBC".into(),
        }]);
        let html = render_slip(&settings(None), &s, "Asha Verma");
        assert!(html.contains("S-0042"));
        assert!(html.contains("<li>CBC</li>"));
        assert!(html.contains("Sunrise Diagnostics"));
    }
}
