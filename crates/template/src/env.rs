use crate::compile::{Instr, Template};
use crate::error::{HelperError, TemplateError};
use core_types::{NodeKey, RegionKey};
use dom_store::DomStore;
use idom::{RenderContext, StringRenderer};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

static MISSING: Value = Value::Null;

/// Per-call context handed to a helper.
pub struct HelperOptions<'a> {
    pub ctx: &'a mut dyn RenderContext,
    /// Identity of the call site within this render of the template; the
    /// same site in the same instance gets the same key on every pass.
    pub region: RegionKey,
}

/// A named operation callable from template markup.
pub trait Helper {
    /// Invoked once per occurrence, in document order, during each render pass.
    fn call(&self, params: &[&Value], options: HelperOptions<'_>) -> Result<(), HelperError>;

    /// Invoked after each live patch pass over `dom` has finished.
    fn after_patch(&self, _dom: &DomStore) {}
}

/// Anything a helper can be registered on.
pub trait HelperEnv {
    fn register_helper(&mut self, name: &str, helper: Rc<dyn Helper>);
}

#[derive(Default)]
pub struct Environment {
    helpers: HashMap<String, Rc<dyn Helper>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, source: &str) -> Result<Template, TemplateError> {
        Template::compile(source)
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Render `template` with `data` into any render context. Rendering the
    /// same template more than once in a pass gives each render its own
    /// region keys.
    pub fn render(
        &self,
        template: &Template,
        data: &Value,
        ctx: &mut dyn RenderContext,
    ) -> Result<(), TemplateError> {
        let instance = ctx.next_instance(template.id());
        for instr in template.instrs() {
            match instr {
                Instr::Open {
                    name,
                    key,
                    attributes,
                } => ctx.open_element(name, key.as_deref(), attributes)?,
                Instr::Close { name } => ctx.close_element(name)?,
                Instr::Text(text) => ctx.text(text)?,
                Instr::Mustache { site, head, args } => match self.helpers.get(head) {
                    Some(helper) => {
                        let params: Vec<&Value> = args.iter().map(|path| lookup(data, path)).collect();
                        let region = template.region_key(instance, *site);
                        log::trace!(target: "template.render", "helper {head} at {region}");
                        helper
                            .call(
                                &params,
                                HelperOptions {
                                    ctx: &mut *ctx,
                                    region,
                                },
                            )
                            .map_err(|source| TemplateError::Helper {
                                name: head.clone(),
                                source,
                            })?;
                    }
                    None if args.is_empty() => render_value(lookup(data, head), ctx)?,
                    None => return Err(TemplateError::UnknownHelper(head.clone())),
                },
            }
        }
        Ok(())
    }

    /// Render to markup with the text-only backend.
    pub fn render_to_string(&self, template: &Template, data: &Value) -> Result<String, TemplateError> {
        idom::render_to_string(|out: &mut StringRenderer| self.render(template, data, out))
    }

    /// Patch the children of `host` in place, then let helpers observe the result.
    pub fn patch(
        &self,
        dom: &mut DomStore,
        host: NodeKey,
        template: &Template,
        data: &Value,
    ) -> Result<(), TemplateError> {
        let result = idom::patch(dom, host, |walker: &mut idom::DomWalker<'_>| {
            self.render(template, data, walker)
        });
        let mut notified: Vec<*const dyn Helper> = Vec::new();
        for helper in self.helpers.values() {
            let ptr = Rc::as_ptr(helper);
            if notified.iter().any(|seen| std::ptr::addr_eq(*seen, ptr)) {
                continue;
            }
            notified.push(ptr);
            helper.after_patch(dom);
        }
        result
    }
}

impl HelperEnv for Environment {
    fn register_helper(&mut self, name: &str, helper: Rc<dyn Helper>) {
        self.helpers.insert(name.to_string(), helper);
    }
}

/// Resolve a dotted path (`a.b.0`) against `data`. `this` and `.` name the root.
pub fn lookup<'v>(data: &'v Value, path: &str) -> &'v Value {
    if path == "this" || path == "." {
        return data;
    }
    let path = path.strip_prefix("this.").unwrap_or(path);
    let mut current = data;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return &MISSING,
        }
    }
    current
}

fn render_value(value: &Value, ctx: &mut dyn RenderContext) -> Result<(), TemplateError> {
    match value {
        Value::Null => {}
        Value::String(s) => ctx.text(s)?,
        Value::Bool(_) | Value::Number(_) => ctx.text(&value.to_string())?,
        Value::Array(_) | Value::Object(_) => {
            log::debug!(target: "template.render", "skipping non-scalar value in text position");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(String, RegionKey)>>,
        patches: RefCell<usize>,
    }

    impl Helper for Recorder {
        fn call(&self, params: &[&Value], options: HelperOptions<'_>) -> Result<(), HelperError> {
            let arg = params.first().map(|v| v.to_string()).unwrap_or_default();
            self.calls.borrow_mut().push((arg, options.region.clone()));
            options.ctx.text("!")?;
            Ok(())
        }

        fn after_patch(&self, _dom: &DomStore) {
            *self.patches.borrow_mut() += 1;
        }
    }

    #[test]
    fn lookup_resolves_dotted_paths() {
        let data = json!({"a": {"b": [1, {"c": "deep"}]}});
        assert_eq!(lookup(&data, "a.b.1.c"), &json!("deep"));
        assert_eq!(lookup(&data, "this.a.b.0"), &json!(1));
        assert_eq!(lookup(&data, "a.missing"), &Value::Null);
        assert_eq!(lookup(&data, "this"), &data);
    }

    #[test]
    fn renders_text_values_escaped() {
        let env = Environment::new();
        let t = env.compile("<p>{{ name }} is {{ age }}</p>").expect("compile");
        let out = env
            .render_to_string(&t, &json!({"name": "<b>Ann</b>", "age": 30}))
            .expect("render");
        assert_eq!(out, "<p>&lt;b&gt;Ann&lt;/b&gt; is 30</p>");
    }

    #[test]
    fn helpers_receive_params_and_stable_regions() {
        let mut env = Environment::new();
        let recorder = Rc::new(Recorder::default());
        env.register_helper("rec", recorder.clone());
        env.register_helper("alias", recorder.clone());
        let t = env.compile("<p>{{ rec a }}{{ alias b }}</p>").expect("compile");
        let data = json!({"a": "x", "b": 2});

        assert_eq!(env.render_to_string(&t, &data).expect("render"), "<p>!!</p>");
        let mut dom = DomStore::new();
        let host = dom.create_element("div", &[]);
        let root = dom.root();
        dom.append_child(root, host).expect("append");
        env.patch(&mut dom, host, &t, &data).expect("patch");

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0, "\"x\"");
        assert_eq!(calls[1].0, "2");
        assert_eq!(calls[0].1, calls[2].1, "same site, same region across renders");
        assert_ne!(calls[0].1, calls[1].1);
        assert_eq!(*recorder.patches.borrow(), 1, "shared helper notified once");
        assert_eq!(dom.inner_html(host).expect("html"), "<p>!!</p>");
    }

    #[test]
    fn repeated_renders_get_their_own_regions() {
        let mut env = Environment::new();
        let recorder = Rc::new(Recorder::default());
        env.register_helper("rec", recorder.clone());
        let item = env.compile("{{ rec a }}").expect("compile");

        for _ in 0..2 {
            let out = idom::render_to_string(|r: &mut StringRenderer| {
                env.render(&item, &json!({"a": 1}), r)?;
                env.render(&item, &json!({"a": 2}), r)
            })
            .expect("render");
            assert_eq!(out, "!!");
        }

        let calls = recorder.calls.borrow();
        let regions: Vec<&RegionKey> = calls.iter().map(|(_, region)| region).collect();
        assert_ne!(regions[0], regions[1], "two renders in one pass");
        assert_eq!(regions[0], regions[2], "first render, next pass");
        assert_eq!(regions[1], regions[3], "second render, next pass");
    }

    #[test]
    fn unknown_helper_with_args_is_an_error() {
        let env = Environment::new();
        let t = env.compile("{{ nope x }}").expect("compile");
        assert!(matches!(
            env.render_to_string(&t, &json!({})),
            Err(TemplateError::UnknownHelper(name)) if name == "nope"
        ));
    }
}
