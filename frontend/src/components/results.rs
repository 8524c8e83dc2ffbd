use super::super::ClassifierPage;
use yew::prelude::*;

pub fn render_results(model: &ClassifierPage) -> Html {
    let Some(result) = &model.result else {
        return html! {};
    };
    html! {
        <div class="results-container">
            <h2 class="prediction">{ format!("Predicción: {}", result.label) }</h2>
            <p class="confidence">{ format!("Confianza: {}", result.confidence_display) }</p>
        </div>
    }
}
