mod support;

use std::time::Duration;

use htmlpdf::trigger::{Callback, Composite, Element, Event, Timer, Variable};
use htmlpdf::{CreateOptions, Error};
use support::{FakeBackend, Reply, assert_timeout, boolean, standard_reply, thrown};

fn evaluate_replies(ready_after: usize) -> FakeBackend {
	FakeBackend::new(move |method, params, nth| match method {
		"Runtime.evaluate" => Reply::Result(boolean(nth >= ready_after)),
		_ => standard_reply(method, params, nth),
	})
}

#[tokio::test]
async fn timer_delays_print_after_load() {
	let (backend, generator) = FakeBackend::standard().into_generator();
	let options = CreateOptions::new().completion_trigger(Timer::from_millis(50));

	generator.create("https://example.test", &options).await.unwrap();

	let navigate = backend.first("Page.navigate").unwrap();
	let print = backend.first("Page.printToPDF").unwrap();
	assert!(print.at.duration_since(navigate.at) >= Duration::from_millis(50));
}

#[tokio::test]
async fn variable_resolves_on_the_poll_that_observes_truthiness() {
	let (backend, generator) = evaluate_replies(3).into_generator();
	let options =
		CreateOptions::new().completion_trigger(Variable::default().with_interval(Duration::from_millis(10)));

	generator.create("<h1>hi</h1>", &options).await.unwrap();

	assert_eq!(backend.count("Runtime.evaluate"), 4);
	let evaluate = backend.first("Runtime.evaluate").unwrap();
	assert_eq!(evaluate.params["expression"], r#"!!window["htmlPdfDone"]"#);
	let last_poll = backend.last("Runtime.evaluate").unwrap();
	let print = backend.first("Page.printToPDF").unwrap();
	assert!(print.at >= last_poll.at);
	assert!(last_poll.at.duration_since(evaluate.at) >= Duration::from_millis(30));
}

#[tokio::test]
async fn variable_gives_up_after_max_attempts() {
	let (backend, generator) = evaluate_replies(usize::MAX).into_generator();
	let options = CreateOptions::new().completion_trigger(
		Variable::new("chartsReady")
			.with_interval(Duration::from_millis(5))
			.with_max_attempts(4),
	);

	assert_timeout(generator.create("<h1>hi</h1>", &options).await);

	assert_eq!(backend.count("Runtime.evaluate"), 4);
	assert_eq!(backend.count("Page.printToPDF"), 0);
	assert_eq!(backend.closes(), 1);
}

#[tokio::test]
async fn variable_gives_up_after_its_own_timeout() {
	let (backend, generator) = evaluate_replies(usize::MAX).into_generator();
	let options = CreateOptions::new().completion_trigger(
		Variable::expression("window.chart && window.chart.done")
			.with_interval(Duration::from_millis(10))
			.with_timeout(Duration::from_millis(45)),
	);

	assert_timeout(generator.create("<h1>hi</h1>", &options).await);

	let polls = backend.count("Runtime.evaluate");
	assert!((1..=5).contains(&polls), "polled {polls} times");
	assert_eq!(backend.count("Page.printToPDF"), 0);
}

#[tokio::test]
async fn element_polls_for_selector() {
	let (backend, generator) = evaluate_replies(2).into_generator();
	let options =
		CreateOptions::new().completion_trigger(Element::new("#chart svg").with_interval(Duration::from_millis(5)));

	generator.create("<div id=chart></div>", &options).await.unwrap();

	assert_eq!(backend.count("Runtime.evaluate"), 3);
	assert_eq!(
		backend.first("Runtime.evaluate").unwrap().params["expression"],
		r##"document.querySelector("#chart svg") !== null"##
	);
}

#[tokio::test]
async fn evaluation_failure_rejects_without_printing() {
	let (backend, generator) = FakeBackend::new(|method, params, nth| match method {
		"Runtime.evaluate" => Reply::Result(thrown("ReferenceError: chart is not defined")),
		_ => standard_reply(method, params, nth),
	})
	.into_generator();
	let options = CreateOptions::new().completion_trigger(Variable::expression("chart.done"));

	let err = generator.create("<h1>hi</h1>", &options).await.unwrap_err();

	assert!(matches!(&err, Error::Evaluation(message) if message == "ReferenceError: chart is not defined"));
	assert_eq!(backend.count("Runtime.evaluate"), 1);
	assert_eq!(backend.count("Page.printToPDF"), 0);
	assert_eq!(backend.closes(), 1);
	assert_eq!(backend.kills(), 1);
}

#[tokio::test]
async fn event_trigger_awaits_page_promise() {
	let (backend, generator) = FakeBackend::standard().into_generator();
	let options = CreateOptions::new().completion_trigger(Event::new("charts-rendered"));

	generator.create("<h1>hi</h1>", &options).await.unwrap();

	let evaluate = backend.first("Runtime.evaluate").unwrap();
	assert_eq!(evaluate.params["awaitPromise"], true);
	assert!(evaluate.params["expression"].as_str().unwrap().contains(r#"addEventListener("charts-rendered""#));
}

#[tokio::test]
async fn event_trigger_page_timeout_is_evaluation_error() {
	let (backend, generator) = FakeBackend::new(|method, params, nth| match method {
		"Runtime.evaluate" => Reply::Delayed(
			Duration::from_millis(20),
			Box::new(Reply::Result(thrown("Error: Timeout waiting for event charts-rendered"))),
		),
		_ => standard_reply(method, params, nth),
	})
	.into_generator();
	let options = CreateOptions::new()
		.completion_trigger(Event::new("charts-rendered").with_timeout(Duration::from_millis(20)));

	let err = generator.create("<h1>hi</h1>", &options).await.unwrap_err();

	assert!(err.is_evaluation());
	assert!(err.to_string().contains("Timeout waiting for event"));
	assert_eq!(backend.count("Page.printToPDF"), 0);
}

#[tokio::test]
async fn callback_trigger_installs_window_function() {
	let (backend, generator) = FakeBackend::standard().into_generator();
	let options = CreateOptions::new().completion_trigger(Callback::default());

	generator.create("<h1>hi</h1>", &options).await.unwrap();

	let evaluate = backend.first("Runtime.evaluate").unwrap();
	assert_eq!(evaluate.params["awaitPromise"], true);
	assert!(evaluate.params["expression"].as_str().unwrap().contains(r#"window["htmlPdfCb"]"#));
	assert_eq!(backend.count("Page.printToPDF"), 1);
}

#[tokio::test]
async fn composite_all_runs_every_child_in_order() {
	let (backend, generator) = FakeBackend::standard().into_generator();
	let options = CreateOptions::new().completion_trigger(
		Composite::all()
			.with(Timer::from_millis(30))
			.with(Variable::default())
			.with(Element::new("main")),
	);

	generator.create("<main></main>", &options).await.unwrap();

	let navigate = backend.first("Page.navigate").unwrap();
	let first_poll = backend.first("Runtime.evaluate").unwrap();
	assert!(first_poll.at.duration_since(navigate.at) >= Duration::from_millis(30));
	assert_eq!(backend.count("Runtime.evaluate"), 2);
}

#[tokio::test]
async fn composite_all_stops_at_first_failure() {
	let (backend, generator) = evaluate_replies(usize::MAX).into_generator();
	let options = CreateOptions::new().completion_trigger(
		Composite::all()
			.with(Variable::default().with_max_attempts(1))
			.with(Timer::from_millis(10_000)),
	);

	assert_timeout(generator.create("<h1>hi</h1>", &options).await);
	assert_eq!(backend.count("Page.printToPDF"), 0);
}

#[tokio::test]
async fn composite_any_resolves_on_first_ready_child() {
	let (backend, generator) = evaluate_replies(usize::MAX).into_generator();
	let options = CreateOptions::new().completion_trigger(
		Composite::any()
			.with(Variable::default().with_interval(Duration::from_millis(10)))
			.with(Timer::from_millis(40)),
	);

	generator.create("<h1>hi</h1>", &options).await.unwrap();

	assert_eq!(backend.count("Page.printToPDF"), 1);
	assert!(backend.count("Runtime.evaluate") >= 1);
}

#[tokio::test]
async fn composite_any_surfaces_child_evaluation_failure() {
	let (backend, generator) = FakeBackend::new(|method, params, nth| match method {
		"Runtime.evaluate" => Reply::Result(thrown("ReferenceError: chart is not defined")),
		_ => standard_reply(method, params, nth),
	})
	.into_generator();
	let options = CreateOptions::new().completion_trigger(
		Composite::any()
			.with(Element::new("#chart"))
			.with(Timer::from_millis(40)),
	);

	let err = generator.create("<h1>hi</h1>", &options).await.unwrap_err();

	assert!(matches!(&err, Error::Evaluation(message) if message == "ReferenceError: chart is not defined"));
	assert_eq!(backend.count("Runtime.evaluate"), 1);
	assert_eq!(backend.count("Page.printToPDF"), 0);
}

#[tokio::test]
async fn composite_any_times_out_when_every_child_times_out() {
	let (backend, generator) = evaluate_replies(usize::MAX).into_generator();
	let options = CreateOptions::new().completion_trigger(
		Composite::any()
			.with(Variable::default().with_interval(Duration::from_millis(5)).with_max_attempts(3))
			.with(Element::new("main").with_interval(Duration::from_millis(5)).with_max_attempts(2)),
	);

	assert_timeout(generator.create("<h1>hi</h1>", &options).await);
	assert_eq!(backend.count("Runtime.evaluate"), 5);
	assert_eq!(backend.count("Page.printToPDF"), 0);
}

#[tokio::test]
async fn empty_composite_is_ready() {
	let (backend, generator) = FakeBackend::standard().into_generator();

	generator
		.create("<h1>hi</h1>", &CreateOptions::new().completion_trigger(Composite::any()))
		.await
		.unwrap();

	assert_eq!(backend.count("Page.printToPDF"), 1);
}
