use super::{TrendDirection, TrendForecast};
use crate::features::{Feature, FeatureVector};

/// One-paragraph rationale for a forecast.
pub(super) fn explain(forecast: &TrendForecast, features: &FeatureVector) -> String {
    let mut clauses = Vec::with_capacity(5);

    let headline = match forecast.direction {
        TrendDirection::Bullish => "Upward",
        TrendDirection::Bearish => "Downward",
        TrendDirection::Neutral => "Sideways",
    };
    clauses.push(format!(
        "{headline} trend expected for {} ({:.1}% probability, uncertainty {:.2})",
        forecast.pair,
        forecast.confidence * 100.0,
        forecast.uncertainty
    ));

    let ratio = features.get(Feature::BullishRatio);
    if ratio > 0.6 {
        clauses.push(format!("strong buying momentum ({:.0}% up periods)", ratio * 100.0));
    } else if ratio < 0.4 {
        clauses.push(format!(
            "strong selling pressure ({:.0}% down periods)",
            (1.0 - ratio) * 100.0
        ));
    }

    let osc = features.get(Feature::Oscillator);
    if osc > 70.0 {
        clauses.push(format!("overbought oscillator at {osc:.1}"));
    } else if osc > 0.0 && osc < 30.0 {
        clauses.push(format!("oversold oscillator at {osc:.1}"));
    }

    let vs_ma = features.get(Feature::PriceVsShortMa);
    if vs_ma > 0.01 {
        clauses.push(format!("price {:.2}% above its short moving average", vs_ma * 100.0));
    } else if vs_ma < -0.01 {
        clauses.push(format!(
            "price {:.2}% below its short moving average",
            vs_ma.abs() * 100.0
        ));
    }

    let vol = features.get(Feature::VolatilityMedium);
    if vol > 0.02 {
        clauses.push(format!("elevated volatility ({:.2}%)", vol * 100.0));
    }

    format!("{}.", clauses.join("; "))
}

#[cfg(test)]
mod tests {
    use crate::features::{Feature, FeatureVector};
    use crate::forecast::TrendForecaster;

    #[test]
    fn mentions_direction_and_pair() {
        let fv = FeatureVector::new("USDJPY", 150.0).with(Feature::MaCrossover, 0.02);
        let fc = TrendForecaster::default().forecast(&fv);
        assert!(fc.explanation.starts_with("Upward trend expected for USDJPY"));
        assert!(fc.explanation.ends_with('.'));
    }

    #[test]
    fn flags_overbought_and_momentum() {
        let fv = FeatureVector::new("EURUSD", 1.1)
            .with(Feature::Oscillator, 75.0)
            .with(Feature::OscillatorDeviation, 0.5)
            .with(Feature::BullishRatio, 0.8);
        let text = TrendForecaster::default().forecast(&fv).explanation;
        assert!(text.contains("overbought oscillator at 75.0"), "{text}");
        assert!(text.contains("80% up periods"), "{text}");
    }

    #[test]
    fn flags_selling_pressure_and_volatility() {
        let fv = FeatureVector::new("EURUSD", 1.1)
            .with(Feature::Oscillator, 25.0)
            .with(Feature::BullishRatio, 0.2)
            .with(Feature::PriceVsShortMa, -0.02)
            .with(Feature::VolatilityMedium, 0.03);
        let text = TrendForecaster::default().forecast(&fv).explanation;
        assert!(text.contains("oversold oscillator"), "{text}");
        assert!(text.contains("80% down periods"), "{text}");
        assert!(text.contains("below its short moving average"), "{text}");
        assert!(text.contains("elevated volatility (3.00%)"), "{text}");
    }
}
