use axum::http::StatusCode;

use crate::{
    listing::{ListQuery, SortField},
    recipe::RecipeRecord,
    wizard::{FINAL_STEP, Flow, StepPage},
};

const LAYOUT: &str = include_str!("../assets/layout.html");

const COLUMNS: [(SortField, &str); 6] = [
    (SortField::Name, "Name"),
    (SortField::Base, "Base"),
    (SortField::Flavor, "Flavor"),
    (SortField::Nutrition, "Nutrition"),
    (SortField::Texture, "Texture"),
    (SortField::CreatedAt, "Created"),
];

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Percent-encodes a query parameter value.
fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());

    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }

    encoded
}

fn layout(title: &str, content: &str) -> String {
    LAYOUT
        .replace("{{title}}", &escape(title))
        .replace("{{content}}", content)
}

pub fn index() -> String {
    layout(
        "Home",
        r#"<h1>Recipe Builder</h1>
<p>Build a recipe one step at a time: base, flavor, nutrition, texture, then a name.</p>
<p><a href="/create">Start a new recipe</a> or <a href="/read">browse saved ones</a>.</p>"#,
    )
}

pub fn recipe_list(records: &[RecipeRecord], query: &ListQuery) -> String {
    let search = encode_query(&query.search);
    let mut content = String::new();

    content.push_str(&format!(
        r#"<h1>Recipes</h1>
<form method="get" action="/read">
    <input type="hidden" name="sort" value="{sort}">
    <input type="hidden" name="order" value="{order}">
    <input type="search" name="search" value="{value}" placeholder="Search by name">
    <button type="submit">Search</button>
</form>
<table>
<thead><tr>"#,
        sort = query.sort.as_str(),
        order = query.order.as_str(),
        value = escape(&query.search),
    ));

    for (field, label) in COLUMNS {
        // the active column flips direction, the others start from the current one
        let order = if field == query.sort {
            query.next_order()
        } else {
            query.order
        };

        content.push_str(&format!(
            r#"<th><a href="/read?sort={}&amp;order={}&amp;search={search}">{label}</a></th>"#,
            field.as_str(),
            order.as_str(),
        ));
    }
    content.push_str("<th></th></tr></thead>\n<tbody>\n");

    for record in records {
        let recipe = &record.recipe;
        content.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href="/edit/{id}">Edit</a> <a href="/delete/{id}">Delete</a></td></tr>"#,
            escape(&recipe.name),
            escape(&recipe.base),
            escape(&recipe.flavor),
            escape(&recipe.nutrition),
            escape(&recipe.texture),
            recipe.created_at.format("%Y-%m-%d %H:%M UTC"),
            id = record.id,
        ));
        content.push('\n');
    }

    if records.is_empty() {
        content.push_str(r#"<tr><td colspan="7">No recipes yet.</td></tr>"#);
    }
    content.push_str("</tbody>\n</table>");

    layout("Recipes", &content)
}

pub fn step_form(flow: Flow, page: &StepPage, value: &str) -> String {
    let heading = match flow {
        Flow::Create => "New recipe",
        Flow::Edit(_) => "Edit recipe",
    };
    let forward = if page.number == FINAL_STEP - 1 {
        "Save"
    } else {
        "Next"
    };
    let back = if page.number > 1 {
        r#"<button type="submit" name="navigation" value="prev" formnovalidate>Back</button>"#
    } else {
        ""
    };

    let content = format!(
        r#"<h1>{heading}</h1>
<p>Step {number} of {last}</p>
<form class="step" method="post" action="{action}">
    <input type="hidden" name="step" value="{number}">
    <label for="{field}">{label}</label>
    <p>{prompt}</p>
    <input type="text" id="{field}" name="{field}" value="{value}" autofocus>
    {back}
    <button type="submit" name="navigation" value="next">{forward}</button>
</form>"#,
        number = page.number,
        last = FINAL_STEP - 1,
        action = escape(&flow.path()),
        field = page.field,
        label = page.label,
        prompt = escape(page.prompt),
        value = escape(value),
    );

    layout(heading, &content)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let content = format!(
        r#"<h1>{status}</h1>
<p class="error">{message}</p>
<p><a href="/">Back to the start</a></p>"#,
        message = escape(message),
    );

    layout("Error", &content)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        listing::ListParams,
        recipe::{Recipe, RecipeId},
        wizard::PAGES,
    };

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("green mango"), "green%20mango");
        assert_eq!(encode_query("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_query("Oat-milk_1.0~"), "Oat-milk_1.0~");
    }

    #[test]
    fn test_list_links_toggle_active_column() {
        let query = ListQuery::from_params(&ListParams {
            sort: Some("name".into()),
            order: Some("asc".into()),
            search: Some("mango smoothie".into()),
        });
        let record = RecipeRecord {
            id: RecipeId::new(),
            recipe: Recipe {
                base: "oat".into(),
                flavor: "mango".into(),
                nutrition: "fiber".into(),
                texture: "smooth".into(),
                name: "<Mango> smoothie".into(),
                created_at: Utc::now(),
            },
        };

        let html = recipe_list(std::slice::from_ref(&record), &query);

        assert!(html.contains("/read?sort=name&amp;order=desc&amp;search=mango%20smoothie"));
        assert!(html.contains("/read?sort=base&amp;order=asc&amp;search=mango%20smoothie"));
        assert!(html.contains("&lt;Mango&gt; smoothie"));
        assert!(html.contains(&format!("/delete/{}", record.id)));
    }

    #[test]
    fn test_step_form_buttons() {
        let first = step_form(Flow::Create, &PAGES[0], "oat");
        assert!(first.contains(r#"action="/create""#));
        assert!(first.contains(r#"name="base" value="oat""#));
        assert!(!first.contains("value=\"prev\""));

        let id = RecipeId::new();
        let last = step_form(Flow::Edit(id), &PAGES[4], "");
        assert!(last.contains(&format!(r#"action="/edit/{id}""#)));
        assert!(last.contains("value=\"prev\""));
        assert!(last.contains(">Save</button>"));
    }
}
