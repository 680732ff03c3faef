use dom_store::{DomPatch, DomStore, NodeKey};
use serde_json::{Value, json};
use template::{Environment, Template};
use verbatim::register_verbatim_helper;

const BASIC_TEMPLATE: &str = "<div class=\"content\">\n  {{ idomVerbatim html }}\n</div>";

const NESTED_TEMPLATE: &str = "<section class=\"section\">
  <div class=\"content\">
    <span>Some content</span>
    Text
    {{ idomVerbatim html}}
    <h2>Some other content</h2>
  </div>
</section>";

const HELLO: &str = "<h1>Hello world!</h1>";
const HELLO_AND_MORE: &str = "<h1>Hello world!</h1>Here is some text.<h2>And a subheading!</h2>";

fn nested_expected(inner: &str) -> String {
    format!(
        "<section class=\"section\">
  <div class=\"content\">
    <span>Some content</span>
    Text
    {inner}
    <h2>Some other content</h2>
  </div>
</section>"
    )
}

struct Fixture {
    env: Environment,
    template: Template,
    dom: DomStore,
    host: NodeKey,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let mut env = Environment::new();
        register_verbatim_helper(&mut env);
        let template = env.compile(source).expect("compile template");
        let mut dom = DomStore::new();
        let host = dom.create_element("div", &[]);
        let root = dom.root();
        dom.append_child(root, host).expect("attach host");
        Self {
            env,
            template,
            dom,
            host,
        }
    }

    fn patch(&mut self, data: Value) -> String {
        self.env
            .patch(&mut self.dom, self.host, &self.template, &data)
            .expect("patch");
        self.dom.inner_html(self.host).expect("inner html")
    }

    fn structural_writes(&mut self, data: Value) -> usize {
        self.dom.record_patches(true);
        self.patch(data);
        let writes = self
            .dom
            .take_patches()
            .iter()
            .filter(|p| p.is_structural())
            .count();
        self.dom.record_patches(false);
        writes
    }
}

#[test]
fn renders_verbatim_html_to_text() {
    let mut env = Environment::new();
    register_verbatim_helper(&mut env);
    let template = env.compile(BASIC_TEMPLATE).expect("compile");
    let out = env
        .render_to_string(&template, &json!({ "html": HELLO }))
        .expect("render");
    assert_eq!(out, "<div class=\"content\">\n  <h1>Hello world!</h1>\n</div>");
}

#[test]
fn text_backend_does_not_sanitize() {
    let mut env = Environment::new();
    register_verbatim_helper(&mut env);
    let template = env
        .compile("<div>{{ incVerbatim html }}</div>")
        .expect("compile");
    let out = env
        .render_to_string(&template, &json!({ "html": "<img src=x onerror=alert(1)>" }))
        .expect("render");
    assert_eq!(out, "<div><img src=x onerror=alert(1)></div>");
}

#[test]
fn renders_to_the_dom() {
    let mut fx = Fixture::new(BASIC_TEMPLATE);
    assert_eq!(
        fx.patch(json!({ "html": HELLO })),
        "<div class=\"content\">\n  <h1>Hello world!</h1>\n</div>"
    );
}

#[test]
fn renders_inside_renderer_siblings() {
    let mut fx = Fixture::new(NESTED_TEMPLATE);
    assert_eq!(fx.patch(json!({ "html": HELLO })), nested_expected(HELLO));
}

#[test]
fn renders_plain_text_content() {
    let mut fx = Fixture::new(BASIC_TEMPLATE);
    assert_eq!(
        fx.patch(json!({ "html": "Hello world!" })),
        "<div class=\"content\">\n  Hello world!\n</div>"
    );
}

#[test]
fn renders_multiple_top_level_nodes() {
    let mut fx = Fixture::new(NESTED_TEMPLATE);
    assert_eq!(
        fx.patch(json!({ "html": HELLO_AND_MORE })),
        nested_expected(HELLO_AND_MORE)
    );
}

#[test]
fn same_content_twice_is_left_alone() {
    let mut fx = Fixture::new(NESTED_TEMPLATE);
    assert_eq!(fx.patch(json!({ "html": HELLO })), nested_expected(HELLO));
    let h1 = fx
        .dom
        .inner_html(fx.host)
        .expect("html")
        .find("<h1>")
        .expect("h1 rendered");
    assert_eq!(fx.structural_writes(json!({ "html": HELLO })), 0);
    assert_eq!(
        fx.dom.inner_html(fx.host).expect("html").find("<h1>"),
        Some(h1)
    );
    assert_eq!(fx.patch(json!({ "html": HELLO })), nested_expected(HELLO));
}

#[test]
fn accepts_a_missing_argument() {
    let mut fx = Fixture::new(BASIC_TEMPLATE);
    assert_eq!(fx.patch(json!({})), "<div class=\"content\">\n  \n</div>");
}

#[test]
fn follows_content_changes() {
    let mut fx = Fixture::new(NESTED_TEMPLATE);
    assert_eq!(fx.patch(json!({ "html": HELLO })), nested_expected(HELLO));
    assert_eq!(
        fx.patch(json!({ "html": HELLO_AND_MORE })),
        nested_expected(HELLO_AND_MORE)
    );
    assert_eq!(fx.patch(json!({ "html": HELLO })), nested_expected(HELLO));
    assert_eq!(fx.patch(json!({ "html": null })), nested_expected(""));
}

#[test]
fn adjacent_regions_are_independent() {
    let mut fx = Fixture::new(
        "<div class=\"content\">\n{{ idomVerbatim content1 }}{{ idomVerbatim content2 }}\n</div>",
    );
    let data = json!({
        "content1": "<h1>Hello world!</h1>\nHere is an introductory paragraph.\n",
        "content2": "<h2>About Handlebars Inc</h2>",
    });
    assert_eq!(
        fx.patch(data.clone()),
        "<div class=\"content\">\n<h1>Hello world!</h1>\nHere is an introductory paragraph.\n<h2>About Handlebars Inc</h2>\n</div>"
    );

    let mut without_first = data.clone();
    without_first["content1"] = Value::Null;
    assert_eq!(
        fx.patch(without_first),
        "<div class=\"content\">\n<h2>About Handlebars Inc</h2>\n</div>"
    );
}

#[test]
fn sanitizes_live_content() {
    let mut fx = Fixture::new(BASIC_TEMPLATE);
    let html = fx.patch(json!({
        "html": "<p onclick=\"x()\">ok<script>steal()</script><a href=\"javascript:x()\">l</a></p>"
    }));
    assert_eq!(
        html,
        "<div class=\"content\">\n  <p>ok<a>l</a></p>\n</div>"
    );
}

#[test]
fn tags_follow_the_tree() {
    let mut env = Environment::new();
    let verbatim = register_verbatim_helper(&mut env);
    let template = env.compile(BASIC_TEMPLATE).expect("compile");
    let mut dom = DomStore::new();
    let host = dom.create_element("div", &[]);
    let root = dom.root();
    dom.append_child(root, host).expect("attach host");

    env.patch(&mut dom, host, &template, &json!({ "html": HELLO_AND_MORE }))
        .expect("patch");
    assert_eq!(verbatim.tags().len(), 3);

    let other = env.compile("<p>replaced</p>").expect("compile");
    dom.record_patches(true);
    env.patch(&mut dom, host, &other, &json!({})).expect("patch");
    assert!(
        dom.take_patches()
            .iter()
            .any(|p| matches!(p, DomPatch::RemoveNode { .. })),
        "old template output removed"
    );
    assert!(verbatim.tags().is_empty(), "tags pruned after patch");
}

#[test]
fn renderer_text_never_takes_over_a_region() {
    let mut fixture = Fixture::new("<p>{{ x }}{{ incVerbatim a }}</p>");
    assert_eq!(fixture.patch(json!({ "a": "hi" })), "<p>hi</p>");
    assert_eq!(fixture.patch(json!({ "x": "y", "a": "hi" })), "<p>yhi</p>");
    assert_eq!(fixture.patch(json!({ "a": "hi" })), "<p>hi</p>");
    assert_eq!(fixture.structural_writes(json!({ "a": "hi" })), 0);
    assert_eq!(fixture.patch(json!({ "x": "z", "a": "hi" })), "<p>zhi</p>");
}

fn render_twice(fixture: &mut Fixture, first: &str, second: &str) -> String {
    let Fixture {
        env,
        template,
        dom,
        host,
    } = fixture;
    idom::patch(dom, *host, |walker: &mut idom::DomWalker<'_>| {
        env.render(template, &json!({ "a": first }), walker)?;
        env.render(template, &json!({ "a": second }), walker)
    })
    .expect("patch");
    dom.inner_html(*host).expect("inner html")
}

#[test]
fn one_template_rendered_twice_keeps_both_regions() {
    let mut fixture = Fixture::new("{{ incVerbatim a }}");
    assert_eq!(
        render_twice(&mut fixture, "<b>1</b>", "<i>2</i>"),
        "<b>1</b><i>2</i>"
    );
    fixture.dom.record_patches(true);
    assert_eq!(
        render_twice(&mut fixture, "<b>1</b>", "<i>2</i>"),
        "<b>1</b><i>2</i>"
    );
    assert!(fixture.dom.take_patches().is_empty(), "unchanged pass wrote");
    fixture.dom.record_patches(false);
    assert_eq!(
        render_twice(&mut fixture, "<b>1</b>", "<u>3</u>"),
        "<b>1</b><u>3</u>"
    );
}
