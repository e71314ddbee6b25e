// src/components/report_panel.rs
use crate::report_parser::HighlightedSection;
use crate::selection::ActiveSelection;
use crate::term_highlighter::Segment;
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ReportPanelProps {
    pub sections: Rc<Vec<HighlightedSection>>,
    pub active: ActiveSelection,
    pub on_hover: Callback<Vec<u32>>,
    pub on_leave: Callback<()>,
    pub on_pin: Callback<Vec<u32>>,
}

#[function_component(ReportPanel)]
pub fn report_panel(props: &ReportPanelProps) -> Html {
    if props.sections.is_empty() {
        return html! {
            <div class="text-panel report-panel">
                <h3>{"Diagnosis"}</h3>
                <p class="empty">{"No diagnosis text for this analysis."}</p>
            </div>
        };
    }

    html! {
        <div class="text-panel report-panel">
            <h3>{"Diagnosis"}</h3>
            <div class="text-content">
                { for props.sections.iter().map(|section| render_section(props, section)) }
            </div>
        </div>
    }
}

fn render_section(props: &ReportPanelProps, section: &HighlightedSection) -> Html {
    html! {
        <section class="report-section">
            { match &section.title {
                Some(title) => html! {
                    <h4 class="section-title">{ for title.iter().map(|s| render_segment(props, s)) }</h4>
                },
                None => html! {},
            } }
            if !section.content.iter().all(|s| s.text.is_empty()) {
                <p class="section-content">{ for section.content.iter().map(|s| render_segment(props, s)) }</p>
            }
        </section>
    }
}

fn render_segment(props: &ReportPanelProps, segment: &Segment) -> Html {
    if !segment.is_term() {
        return html! { <>{ segment.text.clone() }</> };
    }

    let numbers = segment.region_numbers();
    let is_active = props.active.intersects(&numbers);

    let onmouseenter = {
        let on_hover = props.on_hover.clone();
        let numbers = numbers.clone();
        Callback::from(move |_: MouseEvent| on_hover.emit(numbers.clone()))
    };
    let onmouseleave = {
        let on_leave = props.on_leave.clone();
        Callback::from(move |_: MouseEvent| on_leave.emit(()))
    };
    let onclick = {
        let on_pin = props.on_pin.clone();
        let numbers = numbers.clone();
        Callback::from(move |_: MouseEvent| on_pin.emit(numbers.clone()))
    };

    let title = format!(
        "Region {}: {}",
        numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        segment.region_labels().join(", ")
    );

    html! {
        <span
            class={classes!("term", is_active.then_some("active"))}
            {title}
            {onmouseenter}
            {onmouseleave}
            {onclick}
        >
            { segment.text.clone() }
        </span>
    }
}
