// src/components/region_legend.rs
use crate::overlay::LegendEntry;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct RegionLegendProps {
    pub entries: Vec<LegendEntry>,
    pub total_regions: usize,
    pub pinned: bool,
    pub on_hover: Callback<Vec<u32>>,
    pub on_leave: Callback<()>,
    pub on_pin: Callback<Vec<u32>>,
}

#[function_component(RegionLegend)]
pub fn region_legend(props: &RegionLegendProps) -> Html {
    let expanded = use_state(|| true);

    let toggle = {
        let expanded = expanded.clone();
        Callback::from(move |_: MouseEvent| expanded.set(!*expanded))
    };

    let rows = props.entries.iter().map(|entry| {
        let number = entry.number;
        let onmouseenter = {
            let on_hover = props.on_hover.clone();
            Callback::from(move |_: MouseEvent| on_hover.emit(vec![number]))
        };
        let onmouseleave = {
            let on_leave = props.on_leave.clone();
            Callback::from(move |_: MouseEvent| on_leave.emit(()))
        };
        let onclick = {
            let on_pin = props.on_pin.clone();
            Callback::from(move |_: MouseEvent| on_pin.emit(vec![number]))
        };

        let title = if entry.terms.is_empty() {
            "Not linked to any report term".to_string()
        } else {
            format!("Report terms: {}", entry.terms.join(", "))
        };

        html! {
            <li
                class={classes!("legend-item", entry.active.then_some("active"))}
                {title}
                {onmouseenter}
                {onmouseleave}
                {onclick}
            >
                <span class="legend-swatch" style={format!("background: {};", entry.color.to_css())}>
                    { number }
                </span>
                <span class="legend-label">{ entry.label.clone() }</span>
            </li>
        }
    });

    html! {
        <div class="legend-panel">
            <div class="legend-header">
                <h3>{ format!("Mentioned regions ({}/{})", props.entries.len(), props.total_regions) }</h3>
                <button class="close-btn" onclick={toggle}>{ if *expanded { "−" } else { "+" } }</button>
            </div>
            if *expanded {
                if props.entries.is_empty() {
                    <p class="empty">{"No region is mentioned in the diagnosis."}</p>
                } else {
                    <ul class="legend-items">{ for rows }</ul>
                }
                if props.pinned {
                    <p class="legend-hint">{"Selection pinned. Click it again or press Esc to release."}</p>
                }
            }
        </div>
    }
}
