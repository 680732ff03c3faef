#![no_main]

use dom_store::{DomStore, NodeKey};
use idom::DomWalker;
use libfuzzer_sys::fuzz_target;
use verbatim::{Content, Verbatim, VerbatimError};

fn pass(verbatim: &Verbatim, dom: &mut DomStore, host: NodeKey, markup: &str) -> bool {
    idom::patch(dom, host, |w: &mut DomWalker<'_>| {
        verbatim.reconcile(w, &Content::from(markup), &"fuzz".into())?;
        Ok::<(), VerbatimError>(())
    })
    .is_ok()
}

fn fresh_render(markup: &str) -> Option<String> {
    let verbatim = Verbatim::default();
    let mut dom = DomStore::new();
    let host = dom.create_element("div", &[]);
    let root = dom.root();
    dom.append_child(root, host).ok()?;
    pass(&verbatim, &mut dom, host, markup).then(|| dom.inner_html(host).ok())?
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let (first, second) = input.split_once('\u{0}').unwrap_or((input, ""));

    let verbatim = Verbatim::default();
    let mut dom = DomStore::new();
    let host = dom.create_element("div", &[]);
    let root = dom.root();
    if dom.append_child(root, host).is_err() || !pass(&verbatim, &mut dom, host, first) {
        return;
    }
    let before = dom.inner_html(host).ok();

    dom.record_patches(true);
    assert!(pass(&verbatim, &mut dom, host, first));
    assert!(dom.take_patches().is_empty(), "identical pass wrote to the tree");
    assert_eq!(dom.inner_html(host).ok(), before);

    if pass(&verbatim, &mut dom, host, second) {
        assert_eq!(dom.inner_html(host).ok(), fresh_render(second));
    }
});
