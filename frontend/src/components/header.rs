use super::super::ClassifierPage;
use yew::prelude::*;

pub fn render_header(model: &ClassifierPage) -> Html {
    let title = model
        .status
        .as_ref()
        .map_or("Clasificador de imágenes", |s| s.title.as_str());
    html! {
        <header class="app-header">
            <h1>{ title }</h1>
        </header>
    }
}
