//! Tag processor tests: templates are processed and compared structurally with the expected
//! output

use serde_json::json;
use thyme_markup::Document;
use thyme_template::{
    Error, FileLoader, ProcessorOptions, Scope, SimpleRequest, TagProcessor, TemplateProcessor,
    Value,
};

mod test_support;
use test_support::{fixtures_dir, process_and_compare, process_to_xml, NS};

fn abc() -> Value {
    Value::from(vec!["a", "b", "c"])
}

#[test]
fn test_if_unless() {
    process_and_compare(
        r#"<?xml version="1.0"?>
<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<div>
<test1 m:if="${true}"/><test2 m:unless="${true}"/>
</div>
</data>"#,
        r#"<data>
<div>
<test1/>
</div>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_if_not_in() {
    let mut scope = Scope::new();
    scope.put("b", abc());

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
	<test m:if="${'d' not in b}"/>
	<gone m:if="${'a' not in b}"/>
</data>"#,
        r#"<data>
	<test/>
</data>"#,
        &scope,
    );
}

#[test]
fn test_text_is_escaped() {
    let mut scope = Scope::new();
    scope.put("x", "<hallo, wereld!>");

    let output = process_to_xml(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2"><test m:text="${x}"/></data>"#,
        &scope,
    );
    assert!(
        output.contains("<test>&lt;hallo, wereld!&gt;</test>"),
        "{output}"
    );
}

#[test]
fn test_utext_inserts_markup() {
    let mut scope = Scope::new();
    scope.put("x", "<b>hallo, wereld!</b>");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
	<test m:utext="${x}"/>
</data>"#,
        r#"<data>
	<test><b>hallo, wereld!</b></test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_utext_output_is_not_processed_again() {
    let mut scope = Scope::new();
    scope.put("x", "<b>[[${y}]]</b>");
    scope.put("y", "injected");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2"><test m:utext="${x}"/></data>"#,
        r#"<data><test><b>[[${y}]]</b></test></data>"#,
        &scope,
    );
}

#[test]
fn test_inline_text_expression() {
    let mut scope = Scope::new();
    scope.put("x", "hallo, wereld!");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
	[[${x}]]
</data>"#,
        r#"<data>
	hallo, wereld!
</data>"#,
        &scope,
    );
}

#[test]
fn test_inline_raw_expression() {
    let mut scope = Scope::new();
    scope.put("x", "<b>hallo, wereld!</b>");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
	[(${x})]
</data>"#,
        r#"<data>
	<b>hallo, wereld!</b>
</data>"#,
        &scope,
    );
}

#[test]
fn test_inline_javascript() {
    let mut scope = Scope::new();
    scope.put("x", "\"<b>'hallo, wereld!'</b>\"");
    scope.put("y", "Een \"moeilijke\" string");
    scope.put("a", abc());

    process_and_compare(
        r#"<?xml version="1.0"?>
<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<script m:inline="javascript">
<![CDATA[
	const x = /*[[${x}]]*/ null;
	var y = [[${y}]];
]]>
</script>
<script m:inline="none">
	const x = /*[[${x}]]*/ null;
	var y = [[${y}]];
</script>
<script>
	const x = /*[[${x}]]*/ null;
	var y = [[${y}]];
</script>

<script m:inline="javascript">
	const a = /*[[${a}]]*/ null
	const b = 1;
</script>
</data>"#,
        r#"<?xml version="1.0"?>
<data>
<script>
<![CDATA[
	const x = "\"<b>'hallo, wereld!'<\/b>\"";
	var y = "Een \"moeilijke\" string";
]]>
</script>
<script>
	const x = /*[[${x}]]*/ null;
	var y = [[${y}]];
</script>
<script>
	const x = /*&quot;&lt;b&gt;&#39;hallo, wereld!&#39;&lt;/b&gt;&quot;*/ null;
	var y = Een &quot;moeilijke&quot; string;
</script>

<script>
	const a = ["a","b","c"]
	const b = 1;
</script>
</data>"#,
        &scope,
    );
}

#[test]
fn test_each() {
    let mut scope = Scope::new();
    scope.put("a", abc());

    let expected = r#"<data>
<test>a</test><test>b</test><test>c</test>
</data>"#;

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:each="b: ${a}" m:text="${b}" />
</data>"#,
        expected,
        &scope,
    );

    // attribute order does not matter
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:text="${b}" m:each="b: ${a}" />
</data>"#,
        expected,
        &scope,
    );
}

#[test]
fn test_each_status() {
    let mut scope = Scope::new();
    scope.put("a", abc());

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:each="b, i: ${a}" m:text="${i}" />
</data>"#,
        r#"<data>
<test>{&quot;count&quot;:1,&quot;current&quot;:&quot;a&quot;,&quot;even&quot;:false,&quot;first&quot;:true,&quot;index&quot;:0,&quot;last&quot;:false,&quot;odd&quot;:true,&quot;size&quot;:3}</test><test>{&quot;count&quot;:2,&quot;current&quot;:&quot;b&quot;,&quot;even&quot;:true,&quot;first&quot;:false,&quot;index&quot;:1,&quot;last&quot;:false,&quot;odd&quot;:false,&quot;size&quot;:3}</test><test>{&quot;count&quot;:3,&quot;current&quot;:&quot;c&quot;,&quot;even&quot;:false,&quot;first&quot;:false,&quot;index&quot;:2,&quot;last&quot;:true,&quot;odd&quot;:true,&quot;size&quot;:3}</test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_each_over_list_literal() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span m:each="x: ${ { 'aap', 'noot', 'mies' } }" m:text="${x}"/>
</data>"#,
        r#"<data>
<span>aap</span>
<span>noot</span>
<span>mies</span>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_each_over_nothing_removes_the_element() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2"><li m:each="x : ${missing}">x</li></data>"#,
        r#"<data/>"#,
        &Scope::new(),
    );
}

#[test]
fn test_attr() {
    let mut scope = Scope::new();
    scope.put("id", "my-id-101");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:attr="data-id=${id}" />
<test m:attr="data-id1=${id}, data-id2=${id}" />
</data>"#,
        r#"<data>
<test data-id="my-id-101" />
<test data-id1="my-id-101" data-id2="my-id-101" />
</data>"#,
        &scope,
    );
}

#[test]
fn test_attrappend_and_attrprepend() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<a title="b" m:attrappend="title='-c'" m:attrprepend="title='a-'"/>
</data>"#,
        r#"<data>
<a title="a-b-c"/>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_generic_attributes() {
    let mut scope = Scope::new();
    scope.put("ok", true);
    scope.put("s", "s");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:class="${ok}? 'ok'" />
<test m:class="${not ok} ?: 'ok'" />
<test m:text="${s?:'geen s'}"/>
</data>"#,
        r#"<data>
<test class="ok" />
<test class="ok" />
<test>s</test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_dates_with_locale() {
    let request =
        SimpleRequest::new("/").with_header("Accept-Language", "nl, en-US;q=0.7, en;q=0.3");
    let scope = Scope::with_request(&request);

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:text="${#dates.format('2019-08-07T12:14:00', '%e %B %Y, %H:%M')}" />
</data>"#,
        r#"<data>
<test> 7 augustus 2019, 12:14</test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_numbers_with_locale() {
    let request = SimpleRequest::new("/")
        .with_header("Accept-Language", "en-GB, en-US;q=0.7, en;q=0.3");
    let scope = Scope::with_request(&request);

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:text="${#numbers.formatDecimal(12345.6789, 1, 2)}" />
<test m:text="${#numbers.formatDecimal(-12.34, 1, 2)}" />
<test m:text="${#numbers.formatDiskSize(12345, 2)}" />
</data>"#,
        r#"<data>
<test>12,345.68</test>
<test>-12.34</test>
<test>12.06 K</test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_object_selection() {
    let mut scope = Scope::new();
    scope.put("p", Value::from(json!({ "n": "x" })));

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<test m:object="${p}"><test2 m:text="*{n}" /></test>
</data>"#,
        r#"<data>
<test><test2>x</test2></test>
</data>"#,
        &scope,
    );
}

#[test]
fn test_boolean_attributes() {
    let mut scope = Scope::new();
    scope.put("b", true);
    scope.put("c", false);

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<input type="checkbox" m:checked="${b}"/>
<input type="checkbox" m:checked="${c}"/>
</data>"#,
        r#"<data>
<input type="checkbox" checked="checked"/>
<input type="checkbox"/>
</data>"#,
        &scope,
    );
}

#[test]
fn test_switch() {
    let mut scope = Scope::new();
    scope.put("a", 2);

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<div m:switch="${a}">
<div m:case="1">1</div>
<div m:case="2">2</div>
<div m:case="3">3</div>
<div m:case="*">*</div>
</div>

<div m:switch="${a}">
<a><div m:case="1">1</div></a>
<div m:case="2">2</div>
<div m:case="3">3</div>
<div m:case="*">*</div>
</div>

<div m:switch="${a}">
<div m:case="1">1<div m:case="2">2</div></div>
<div m:case="2">2</div>
<div m:case="3">3</div>
<div m:case="*">*</div>
</div>
</data>"#,
        r#"<data>
<div><div>2</div></div>

<div><div>2</div></div>

<div><div>2</div></div>
</data>"#,
        &scope,
    );
}

#[test]
fn test_switch_falls_back_to_wildcard() {
    let mut scope = Scope::new();
    scope.put("a", 7);

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<div m:switch="${a}">
<div m:case="1">1</div>
<div m:case="*">first</div>
<div m:case="*">second</div>
</div>
</data>"#,
        r#"<data>
<div><div>first</div></div>
</data>"#,
        &scope,
    );
}

#[test]
fn test_with() {
    let mut scope = Scope::new();
    scope.put("a", "a");
    scope.put("b", "b");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<a m:with="a=${a},b=${b}" m:text="|${a}-${b}|"/>
</data>"#,
        r#"<data>
<a>a-b</a>
</data>"#,
        &scope,
    );
}

#[test]
fn test_insert_replace_include() {
    process_and_compare(
        r#"<?xml version="1.0"?>
<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<div id="frag1">hello world</div>
<span m:insert=" :: #frag1"></span>
<span m:replace=" :: #frag1"></span>
<span m:include=" :: #frag1"></span>
<span m:insert="this :: #frag1"></span>
<span m:replace="this :: #frag1"></span>
<span m:include="this :: #frag1"></span>
<span m:insert="fragment-file :: frag1"></span>
<span m:replace="fragment-file :: frag1"></span>
<span m:include="fragment-file :: frag1"></span>
<span m:insert="fragment-file :: #frag2"></span>
<span m:replace="fragment-file :: #frag2"></span>
<span m:include="fragment-file :: #frag2"></span>
</data>"#,
        r#"<data>
<div id="frag1">hello world</div>
<span><div>hello world</div></span>
<div>hello world</div>
<span>hello world</span>
<span><div>hello world</div></span>
<div>hello world</div>
<span>hello world</span>
<span><div>fragment-1</div></span>
<div>fragment-1</div>
<span>fragment-1</span>
<span><div>fragment-2</div></span>
<div>fragment-2</div>
<span>fragment-2</span>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_missing_fragment_is_reported_in_place() {
    let doc = test_support::process_document(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2"><span m:replace="fragment-file :: nope"/></data>"#,
        &Scope::new(),
    );
    let root = doc.root_element().unwrap();
    let text = doc.text_content(root);
    assert!(text.starts_with("Error processing element 'span'"), "{text}");
}

#[test]
fn test_load_template_fragment() {
    let processor = TemplateProcessor::with_docroot(fixtures_dir()).unwrap();
    let doc = processor.load_template("fragment-file :: frag1").unwrap();

    let expected = Document::parse("<div>fragment-1</div>").unwrap();
    assert!(
        doc.equivalent(&expected),
        "{}",
        doc.to_xml().unwrap_or_default()
    );

    let doc = processor.load_template("~{fragment-file :: #frag2}").unwrap();
    let expected = Document::parse("<div>fragment-2</div>").unwrap();
    assert!(doc.equivalent(&expected));
}

#[test]
fn test_links() {
    let mut scope = Scope::new();
    scope.put("b", "b");
    scope.put("c", "bla met < en =");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span m:text="@{link}"/>
<span m:text="@{link(b=${b})}"/>
<span m:text="@{link/{b}(b=${b})}"/>
<span m:text="@{link(b=${b},test='test&amp;')}"/>
<span m:text="@{link/{b}{b}(b=${b})}"/>
<span m:text="@{link(c=${c})}"/>
</data>"#,
        r#"<data>
<span>link</span>
<span>link?b=b</span>
<span>link/b</span>
<span>link?b=b&amp;test=test%26</span>
<span>link/bb</span>
<span>link?c=bla%20met%20%3C%20en%20%3D</span>
</data>"#,
        &scope,
    );
}

#[test]
fn test_literal_substitution() {
    let mut scope = Scope::new();
    scope.put("b", "b");
    scope.put("c", "bla met < en =");

    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span m:text="||"/>
<span m:text="|een twee drie|"/>
<span m:text="|een ${b} en ${c}|"/>
<span m:text="'een ' + |twee ${b};:;${c}|"/>
</data>"#,
        r#"<data>
<span></span>
<span>een twee drie</span>
<span>een b en bla met &lt; en =</span>
<span>een twee b;:;bla met &lt; en =</span>
</data>"#,
        &scope,
    );
}

#[test]
fn test_remove_modes() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span a="none" m:remove="none"><x/><y/></span>
<span a="all" m:remove="all"><x/><y/></span>
<span a="body" m:remove="body"><x/><y/></span>
<span a="all-but-first" m:remove="all-but-first"><x/><y/></span>
<span a="tag" m:remove="tag"><x><y/></x><z/></span>
</data>"#,
        r#"<data>
<span a="none"><x/><y/></span>

<span a="body"></span>
<span a="all-but-first"><x/></span>
<x><y/></x><z/>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_failed_assertion() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span m:assert="1==0" />
</data>"#,
        r#"<data>
Error processing element 'span': Assertion failed for '1==0'<span/>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_ref_and_block() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<span m:ref="1"/>
<m:block>in een blok<em>met een em</em></m:block>
</data>"#,
        r#"<data>
<span/>
in een blok<em>met een em</em>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_fragment_references_in_current_template() {
    process_and_compare(
        r#"<data xmlns:m="http://www.hekkelman.com/libzeep/m2">
<m:block m:remove="all">
<span m:fragment="fr1">fragment</span>
<span m:ref="fr1">ref</span>
</m:block>
<div m:replace="~{::fr1}"/>
<div m:replace="~{::fr1/text()}"/>
<div m:replace="::fr1"/>
<div m:replace="::fr1/text()"/>
</data>"#,
        r#"<data>

<span>fragment</span><span>ref</span>
fragmentref
<span>fragment</span><span>ref</span>
fragmentref
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_fragment_parameters_with_fragments() {
    process_and_compare(
        r#"<data xmlns:th="http://www.hekkelman.com/libzeep/m2">
<span th:remove="all" th:ref="R_1">ref-1</span>
<th:block th:remove="all">
	<div th:fragment="F_1(arg)"><span th:replace="${arg}"/></div>
	<div th:ref="thediv">The div</div>
</th:block>
<div th:replace="~{::F_1(~{::thediv})}"/>
<div th:replace="::F_1(~{::thediv})"/>
</data>"#,
        r#"<data>

<div><div>The div</div></div>
<div><div>The div</div></div>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_fragment_parameters_across_files() {
    process_and_compare(
        r#"<data xmlns:th="http://www.hekkelman.com/libzeep/m2">
<div th:replace="~{fragment-file::frag3(~{::title})}">
	<title>De titel is vervangen</title>
</div>
<div th:replace="~{fragment-file::frag3(~{})}"/>
</data>"#,
        r#"<data>
<nav>
		<title>De titel is vervangen</title>
	</nav>
<nav>
		<title>Niet vervangen</title>
	</nav>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_include_keeps_foreign_namespaces() {
    let mut scope = Scope::new();
    scope.put("label", "VAL");

    let src = r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2"><span z:include="foreign-namespace :: #shape"/><span z:insert="foreign-namespace :: #shape"/></data>"#;

    process_and_compare(
        src,
        r#"<data><span><b>VAL</b><svg:rect xmlns:svg="http://www.w3.org/2000/svg" width="1"/></span><span><div xmlns:svg="http://www.w3.org/2000/svg"><b>VAL</b><svg:rect width="1"/></div></span></data>"#,
        &scope,
    );

    let doc = test_support::process_document(src, &scope);
    let root = doc.root_element().unwrap();
    let rects: Vec<_> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| doc.local_name(n) == Some("rect"))
        .collect();
    assert_eq!(rects.len(), 2);
    for rect in rects {
        assert_eq!(
            doc.namespace_uri(rect),
            Some("http://www.w3.org/2000/svg")
        );
    }
}

#[test]
fn test_fragment_parameter_as_text() {
    process_and_compare(
        r#"<data xmlns:th="http://www.hekkelman.com/libzeep/m2">
<span th:remove="all" th:ref="R_1">ref-1</span>
<th:block th:remove="all"><div th:fragment="F_1(arg)"><span th:text="${arg}"/></div></th:block>
<div th:replace="~{::R_1}"/>
<div th:replace="~{::F_1(~{::R_1/text()})}"/>
</data>"#,
        r#"<data>




<div><span>ref-1</span></div>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_fragment_bound_with_with() {
    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span z:fragment="f">frag</span>
<div z:with="frag=~{::f}">
	<span z:replace="${frag}"/>
</div>
</data>"#,
        r#"<data>
<span>frag</span>
<div>
	<span>frag</span>
</div>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_fragment_with_value_parameters() {
    let template = r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span z:fragment="f(a)" z:text="${a}"></span>
<span z:replace="~{::f(h)}"/>
</data>"#;
    let expected = r#"<data>
<span/>
<span>hoi</span>
</data>"#;

    let mut scope = Scope::new();
    scope.put("h", "hoi");
    process_and_compare(template, expected, &scope);

    let mut scope = Scope::new();
    scope.put("h", Value::from(json!({ "txt": "hoi" })));
    process_and_compare(
        &template.replace("f(h)", "f(h.txt)"),
        expected,
        &scope,
    );
}

#[test]
fn test_classappend_and_styleappend() {
    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<div class="een" z:classappend="${true} ? 'twee'"/>
<div class="een" z:classappend="${false} ? 'twee'"/>
<div style="width: 30" z:styleappend="height: 30"/>
</data>"#,
        r#"<data>
<div class="een twee"/>
<div class="een"/>
<div style="width: 30; height: 30;"/>
</data>"#,
        &Scope::new(),
    );
}

#[test]
fn test_indexed_member_access() {
    let mut scope = Scope::new();
    scope.put("a", Value::from(json!([{ "s": "S" }, { "s": "T" }])));

    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span z:text="${a[0].s}"/>
<span z:text="${a[1].s}"/>
<span z:text="${b[0].s}"/>
</data>"#,
        r#"<data>
<span>S</span>
<span>T</span>
<span/>
</data>"#,
        &scope,
    );
}

#[test]
fn test_inline_text_reports_bad_expressions() {
    let mut scope = Scope::new();
    scope.put("a", "aap");
    scope.put("b", "noot");

    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span z:inline="text">test [(${a}.${b})]</span>
</data>"#,
        r#"<data>
<span>test Error processing ${a}.${b}</span>
</data>"#,
        &scope,
    );
}

#[test]
fn test_relational_keywords() {
    let mut scope = Scope::new();
    scope.put("x", 2.0);

    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span z:classappend="${x ge 1.5 ? 'greater-equal'}"></span>
<span z:classappend="${x le 1.5 ? 'less-equal'}"></span>
</data>"#,
        r#"<data>
<span class="greater-equal"></span>
<span/>
</data>"#,
        &scope,
    );
}

#[test]
fn test_adjacent_inline_expressions() {
    let mut scope = Scope::new();
    scope.put("a", "x");

    process_and_compare(
        r#"<data xmlns:z="http://www.hekkelman.com/libzeep/m2">
<span>[[${a}]][[${a}]]</span>
</data>"#,
        r#"<data>
<span>xx</span>
</data>"#,
        &scope,
    );
}

#[test]
fn test_cdata_and_doctype() {
    process_and_compare(
        r#"<!DOCTYPE html SYSTEM "about:legacy-compat">
<html>
<span><![CDATA[bla bla]]></span>
</html>"#,
        r#"<!DOCTYPE html SYSTEM "about:legacy-compat">
<html>
<span>bla bla</span>
</html>"#,
        &Scope::new(),
    );
}

#[test]
fn test_custom_prefix_is_stripped() {
    let output = process_to_xml(
        r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:th="http://www.hekkelman.com/libzeep/m2"><p th:text="'x'">y</p></html>"#,
        &Scope::new(),
    );
    assert!(!output.contains("xmlns:th"), "{output}");
    assert!(output.contains("xmlns=\"http://www.w3.org/1999/xhtml\""), "{output}");
    assert!(output.contains("<p>x</p>"), "{output}");
}

#[test]
fn test_scope_depth_limit() {
    let src = format!(
        r#"<data xmlns:m="{NS}">{}<b m:text="'deep'">x</b>{}</data>"#,
        "<d>".repeat(300),
        "</d>".repeat(300)
    );

    let output = process_to_xml(&src, &Scope::new());
    assert!(output.contains("<b>deep</b>"), "{output}");

    let options = ProcessorOptions {
        max_scope_depth: 50,
        ..ProcessorOptions::default()
    };
    let loader = FileLoader::new(fixtures_dir()).unwrap();
    let mut doc = Document::parse(&src).unwrap();
    let root = doc.root_element().unwrap();

    let result = TagProcessor::new(&options, &loader, "").process(&mut doc, root, &Scope::new());
    assert!(matches!(result, Err(Error::ScopeTooDeep(51))));
}
