use gotour_core::i18n::{self, Localize};
use gotour_core::payment::{PaymentRecordStatus, RetryReason};
use gotour_core::search::{self, BookingStats};
use gotour_core::{ApiError, Booking, BookingStatus, Domain, Locale};
use gotour_order::{BookingView, PollHandle, PollOutcome};
use std::io::Write;
use tracing::warn;

use crate::cli::{Command, ListArgs};
use crate::error::CliError;
use crate::state::App;

pub async fn run(app: &App, command: Command, out: &mut dyn Write) -> Result<(), CliError> {
    let locale = app.locale;
    match command {
        Command::List(args) => list(app, &args, out).await,
        Command::Show { id, domain } => {
            let view = BookingView::new(app.bookings.resolve(&id, domain).await?);
            for line in view.summary_lines(locale) {
                writeln!(out, "{}", line)?;
            }
            let actions: Vec<&str> = view.available_actions().iter().map(|a| a.label(locale)).collect();
            writeln!(out, "> {}", actions.join(" | "))?;
            Ok(())
        }
        Command::Confirm(t) => {
            let booking = app.bookings.confirm(t.domain, &t.id).await?;
            print_status(&booking, locale, out)
        }
        Command::Cancel { target, reason } => {
            let booking = app
                .bookings
                .cancel(target.domain, &target.id, reason.as_deref())
                .await?;
            print_status(&booking, locale, out)
        }
        Command::Complete(t) => {
            let booking = app.bookings.complete(t.domain, &t.id).await?;
            print_status(&booking, locale, out)
        }
        Command::MarkPaid(t) => {
            let booking = app.bookings.mark_paid(t.domain, &t.id).await?;
            print_status(&booking, locale, out)
        }
        Command::Refund(t) => {
            let booking = app.bookings.refund(t.domain, &t.id).await?;
            print_status(&booking, locale, out)
        }
        Command::Delete { target, yes } => {
            app.bookings.delete(target.domain, &target.id, yes).await?;
            writeln!(out, "{} deleted", target.id)?;
            Ok(())
        }
        Command::Pay(t) => {
            let booking = app.bookings.get(t.domain, &t.id).await?;
            let checkout = app.payments.start_sepay_checkout(&booking).await?;
            writeln!(out, "payment:   {}", checkout.payment_id)?;
            writeln!(out, "amount:    {}", i18n::format_vnd(checkout.amount, locale))?;
            writeln!(out, "reference: {}", checkout.reference)?;
            if let Some(qr) = &checkout.qr_url {
                writeln!(out, "qr:        {}", qr)?;
            }
            out.flush()?;
            let handle = app.payments.watch(&checkout.payment_id);
            wait_for_payment(&checkout.payment_id, handle, locale, out).await
        }
        Command::WatchPayment { payment_id } => {
            let handle = app.payments.watch(&payment_id);
            wait_for_payment(&payment_id, handle, locale, out).await
        }
        Command::Stats => {
            let list = app.bookings.list_all_mine().await;
            report_failures(&list.failures, locale, out)?;
            print_stats(&list.stats(), locale, out)
        }
    }
}

async fn list(app: &App, args: &ListArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let locale = app.locale;
    let bookings = if args.all {
        let domains: Vec<Domain> = match args.domain {
            Some(d) => vec![d],
            None => Domain::ALL.to_vec(),
        };
        let mut bookings = Vec::new();
        for domain in domains {
            bookings.extend(app.bookings.list_all(domain, args.paging()).await?.items);
        }
        bookings
    } else {
        let list = app.bookings.list_all_mine().await;
        report_failures(&list.failures, locale, out)?;
        list.bookings
    };

    let rows = search::apply(&bookings, &args.filter(), args.sort);
    for b in &rows {
        writeln!(
            out,
            "{:<14} {:<8} {:<12} {:<10} {:>16}  {}",
            b.display_code(),
            b.domain().as_str(),
            b.status.label(locale),
            b.payment_status.label(locale),
            i18n::format_vnd(b.total_price, locale),
            b.created_at.format("%Y-%m-%d")
        )?;
    }
    writeln!(out, "{} / {}", rows.len(), bookings.len())?;
    Ok(())
}

/// Per-domain load failures. An expired session aborts the command.
fn report_failures(failures: &[(Domain, ApiError)], locale: Locale, out: &mut dyn Write) -> Result<(), CliError> {
    for (domain, err) in failures {
        if *err == ApiError::Unauthorized {
            return Err(ApiError::Unauthorized.into());
        }
        writeln!(out, "! {}: {}", domain.label(locale), err.user_message(locale))?;
    }
    Ok(())
}

fn print_status(booking: &Booking, locale: Locale, out: &mut dyn Write) -> Result<(), CliError> {
    writeln!(
        out,
        "{}: {} / {}",
        booking.display_code(),
        booking.status.label(locale),
        booking.payment_status.label(locale)
    )?;
    Ok(())
}

fn print_stats(stats: &BookingStats, locale: Locale, out: &mut dyn Write) -> Result<(), CliError> {
    writeln!(out, "total: {}", stats.total)?;
    for status in [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ] {
        writeln!(out, "  {}: {}", status.label(locale), stats.count(status))?;
    }
    for domain in Domain::ALL {
        let count = stats.by_domain.get(&domain).copied().unwrap_or(0);
        writeln!(out, "  {}: {}", domain.label(locale), count)?;
    }
    writeln!(out, "revenue: {}", i18n::format_vnd(stats.revenue, locale))?;
    Ok(())
}

/// Block until the poll ends or Ctrl-C; dropping the handle stops the poll
async fn wait_for_payment(
    payment_id: &str,
    handle: PollHandle,
    locale: Locale,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => PollOutcome::Stopped,
    };

    match outcome {
        PollOutcome::Resolved(payment) => {
            let detail = match payment.failure() {
                Some(failure) => failure.label(locale),
                None => payment.status.label(locale),
            };
            writeln!(out, "{}: {}", payment.id, detail)?;
            if payment.status == PaymentRecordStatus::Failed {
                warn!("Payment {} failed", payment.id);
            }
            Ok(())
        }
        PollOutcome::Unresolved {
            last: Some(RetryReason::Unauthorized),
        } => Err(ApiError::Unauthorized.into()),
        PollOutcome::Unresolved { last } => Err(CliError::PaymentUnresolved {
            payment_id: payment_id.to_string(),
            last,
        }),
        PollOutcome::Stopped => Err(CliError::PaymentUnresolved {
            payment_id: payment_id.to_string(),
            last: None,
        }),
    }
}
